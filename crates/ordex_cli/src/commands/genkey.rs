//! Genkey command implementation.

use ordex_core::{ItemKey, MonotonicKeyGenerator};

/// Runs the genkey command.
pub fn run(count: usize, monotonic: bool) -> Result<(), Box<dyn std::error::Error>> {
    for key in generate(count, monotonic)? {
        println!("{}", key);
    }
    Ok(())
}

/// Generates `count` keys.
pub fn generate(
    count: usize,
    monotonic: bool,
) -> Result<Vec<ItemKey>, Box<dyn std::error::Error>> {
    if monotonic {
        let generator = MonotonicKeyGenerator::new();
        return Ok((0..count)
            .map(|_| generator.generate())
            .collect::<Result<_, _>>()?);
    }
    Ok((0..count)
        .map(|_| ItemKey::generate())
        .collect::<Result<_, _>>()?)
}
