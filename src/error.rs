use thiserror::Error;

/// Failures reported by `resume` and `yield_now`.
///
/// All of them are local conditions returned to the immediate caller;
/// nothing is retried on the caller's behalf.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum CoroError {
    /// No coroutine with this id is registered.
    #[error("no such coroutine")]
    ErrorId,

    /// The coroutine is running or has finished, so there is nothing to resume.
    #[error("coroutine is already running")]
    AlreadyRun,

    /// A coroutine that has never started tried to resume itself.
    #[error("cannot resume the main context")]
    ResumeMain,

    #[error("not inside a coroutine")]
    NotInCoro
}

impl CoroError {
    /// Integer code used across the C boundary.
    pub fn code(&self) -> i32 {
        match *self {
            CoroError::NotInCoro => -1,
            CoroError::ResumeMain => -2,
            CoroError::AlreadyRun => -3,
            CoroError::ErrorId => -5
        }
    }
}

pub type Result<T> = ::std::result::Result<T, CoroError>;

/// Why a suspended coroutine got control back.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Wakeup {
    /// Someone called `resume` on it.
    Resumed,
    /// The wake time it asked for was reached by `tick`.
    TimedOut
}

impl Wakeup {
    pub fn code(&self) -> i32 {
        match *self {
            Wakeup::Resumed => 0,
            Wakeup::TimedOut => 1
        }
    }

    pub fn is_timeout(&self) -> bool {
        *self == Wakeup::TimedOut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(CoroError::NotInCoro.code(), -1);
        assert_eq!(CoroError::ResumeMain.code(), -2);
        assert_eq!(CoroError::AlreadyRun.code(), -3);
        assert_eq!(CoroError::ErrorId.code(), -5);
        assert_eq!(Wakeup::Resumed.code(), 0);
        assert_eq!(Wakeup::TimedOut.code(), 1);
    }

    #[test]
    fn errors_have_messages() {
        assert_eq!(CoroError::NotInCoro.to_string(), "not inside a coroutine");
        assert_eq!(CoroError::ErrorId.to_string(), "no such coroutine");
    }
}
