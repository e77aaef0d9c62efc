use std::env;

const DEFAULT_F_CPU: u32 = 16_000_000;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=XIPHOS_F_CPU");
    println!("cargo:rerun-if-env-changed=XIPHOS_NUM_SERVOS");

    // Pass CPU frequency for timing calculations
    let f_cpu = match env::var("XIPHOS_F_CPU") {
        Ok(raw) => raw.trim().parse::<u32>().unwrap_or_else(|_| {
            panic!("XIPHOS_F_CPU must be a frequency in Hz, got {raw:?}")
        }),
        Err(_) => DEFAULT_F_CPU,
    };
    println!("cargo:rustc-env=XIPHOS_F_CPU={f_cpu}");

    // Servo count gates the servo initializer; 0 disables it
    let servos = match env::var("XIPHOS_NUM_SERVOS") {
        Ok(raw) => raw.trim().parse::<u8>().unwrap_or_else(|_| {
            panic!("XIPHOS_NUM_SERVOS must be a count in 0..=255, got {raw:?}")
        }),
        Err(_) => 0,
    };
    println!("cargo:rustc-env=XIPHOS_NUM_SERVOS={servos}");

    // Host builds (tests, simulation) skip the AVR link setup
    let target = env::var("TARGET").unwrap_or_default();
    if target.contains("avr") {
        println!("cargo:rustc-link-arg=-mmcu=atmega1281");
        println!("cargo:warning=Building for ATmega1281 at {} Hz", f_cpu);
    }
}
