//! Custom macros for reducing code repetition in tilewall

/// Unwrap a result, or log the error and skip to the next loop iteration
///
/// # Example
/// ```ignore
/// for item in &items {
///     let image = log_and_continue!(cache.load(&item.id), "Skipping {:?}", item.id);
/// }
/// ```
#[macro_export]
macro_rules! log_and_continue {
    ($expr:expr, $($context:tt)+) => {
        match $expr {
            Ok(value) => value,
            Err(e) => {
                log::warn!("{}: {}", format_args!($($context)+), e);
                continue;
            }
        }
    };
}

/// Check a configuration value against its allowed names, bailing with the
/// field name otherwise
///
/// # Example
/// ```ignore
/// validate_enum!("provider", provider, "instagram", "500px", "tumblr")?;
/// ```
#[macro_export]
macro_rules! validate_enum {
    ($field:literal, $value:expr, $($variant:literal),+) => {
        match $value {
            $($variant)|+ => Ok::<(), anyhow::Error>(()),
            other => anyhow::bail!(
                "Invalid {}: {:?} (expected one of: {})",
                $field,
                other,
                [$($variant),+].join(", ")
            ),
        }
    };
}
