use std::collections::HashMap;

use crate::co::{CoroId, Coroutine};

/// Owns every live coroutine, addressed by id.
///
/// Records are boxed so that their saved stack-pointer slots keep a fixed
/// address while the map grows.
pub struct Registry {
    next_id: CoroId,
    coroutines: HashMap<CoroId, Box<Coroutine>>,
    max_concurrent: usize
}

impl Registry {
    pub fn new() -> Registry {
        Registry {
            next_id: 1,
            coroutines: HashMap::new(),
            max_concurrent: 0
        }
    }

    /// Hands out the next id. Ids are never reused.
    pub fn next_id(&mut self) -> CoroId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, co: Box<Coroutine>) {
        self.coroutines.insert(co.id(), co);
        if self.coroutines.len() > self.max_concurrent {
            self.max_concurrent = self.coroutines.len();
        }
    }

    pub fn get(&self, id: CoroId) -> Option<&Coroutine> {
        self.coroutines.get(&id).map(|co| &**co)
    }

    pub fn get_mut(&mut self, id: CoroId) -> Option<&mut Coroutine> {
        self.coroutines.get_mut(&id).map(|co| &mut **co)
    }

    pub fn remove(&mut self, id: CoroId) -> Option<Box<Coroutine>> {
        self.coroutines.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.coroutines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coroutines.is_empty()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}
