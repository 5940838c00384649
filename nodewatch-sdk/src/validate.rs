//! Required-prop checks for widget configuration.

use tracing::warn;

/// Report props that are missing from a widget's configuration.
///
/// Logs one warning naming every missing prop and returns their names.
/// Never fails: a misconfigured widget keeps rendering its placeholder.
///
/// ```rust
/// use nodewatch_sdk::validate_required;
///
/// let missing = validate_required("gauge", &[("client", true), ("variable", false)]);
/// assert_eq!(missing, vec!["variable"]);
/// ```
pub fn validate_required<'a>(component: &str, props: &[(&'a str, bool)]) -> Vec<&'a str> {
    let missing: Vec<&str> = props
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();

    if !missing.is_empty() {
        warn!(
            component,
            missing = %missing.join(", "),
            "Missing required prop(s)"
        );
    }
    missing
}
