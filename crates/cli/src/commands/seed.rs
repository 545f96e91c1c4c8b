//! Store seed validation.

use std::path::Path;

use pineapple_checkout::seed::{SeedError, StoreSeed};
use tracing::info;

/// Parse and validate a seed file and print a summary.
///
/// # Errors
///
/// Returns `SeedError` if the file cannot be read, parsed, or validated.
pub fn check(path: &Path) -> Result<(), SeedError> {
    info!(path = %path.display(), "Checking store seed");
    let seed = StoreSeed::load(path)?;

    #[allow(clippy::print_stdout)]
    {
        println!("Seed OK: {}", path.display());
        for channel in &seed.channels {
            let methods = seed
                .shipping_methods
                .iter()
                .filter(|m| m.channel == channel.slug)
                .count();
            println!(
                "  channel {} ({}): ships to {}, {methods} shipping method(s)",
                channel.slug,
                channel.currency,
                channel.countries.join(", "),
            );
        }
        println!("  {} variant(s)", seed.variants.len());
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_seed_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../checkout/seed.yaml");
        assert!(check(&path).is_ok());
    }

    #[test]
    fn test_missing_seed_fails() {
        assert!(matches!(
            check(Path::new("/nonexistent/seed.yaml")),
            Err(SeedError::Io { .. })
        ));
    }
}
