//! Polling example
//!
//! This example demonstrates how to:
//! - Hand the driver a Linux I2C bus opener
//! - Bring the sensor up (reset + ALS/PS/IR activation)
//! - Read IR, ALS and PS counts once per second

#[cfg(target_os = "linux")]
use ap3216c::Ap3216c;
#[cfg(target_os = "linux")]
use linux_embedded_hal::{Delay, I2CError, I2cdev};

#[cfg(target_os = "linux")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The driver opens ap3216c::DEVICE_PATH itself during initialization
    let open = |path: &str| I2cdev::new(path).map_err(I2CError::from);
    let mut sensor = Ap3216c::new(open, Delay);

    if let Err(e) = sensor.initialize() {
        eprintln!("init ap3216c fail: {}", e);
        return Err(e.into());
    }

    loop {
        let sample = match sensor.read_sample() {
            Ok(sample) => sample,
            Err(e) => {
                eprintln!("read ap3216c data fail: {}", e);
                return Err(e.into());
            }
        };

        println!(
            "current ir: {}, current als: {}, current ps: {}",
            sample.ir, sample.als, sample.ps
        );

        std::thread::sleep(std::time::Duration::from_secs(1));
    }
}

#[cfg(not(target_os = "linux"))]
fn main() {
    println!("This example requires Linux with I2C support.");
    println!("Please adapt the bus opener for your platform.");
}
