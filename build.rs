extern crate cc;

trait SetupForPlatform {
    fn setup_for_platform(&mut self, platform: &str) -> &mut Self;
}

impl SetupForPlatform for cc::Build {
    fn setup_for_platform(&mut self, platform: &str) -> &mut Self {
        let helper = match platform {
            "x86_64-unknown-linux-gnu"
            | "x86_64-unknown-linux-musl" => "platforms/x86_64-linux/sched_helper.s",
            "aarch64-unknown-linux-gnu"
            | "aarch64-unknown-linux-musl" => "platforms/aarch64-linux/sched_helper.s",
            _ => panic!("Unsupported platform: {}", platform)
        };
        println!("cargo:rerun-if-changed={}", helper);
        self.file(helper)
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    cc::Build::new()
        .setup_for_platform(std::env::var("TARGET").unwrap_or_else(|e| {
            panic!("Error while reading the TARGET environment variable: {:?}", e);
        }).as_str())
        .compile("lightcoro_platform");
}
