use std::{fs, path::Path};

use energy_invoice::policy::Policy;

use crate::{error::Error, Result};

/// Load the policy overrides from a TOML file, or the defaults when no file is given.
///
/// Keys that are left out keep their default value:
///
/// ```toml
/// inductive_limit_percent = 20
/// synthetic_limit_headroom = 1.1
///
/// [[voltage_counterparts]]
/// single = "AG"
/// dual = "OG"
/// ```
pub fn load_policy(path: Option<&Path>) -> Result<Policy> {
    let Some(path) = path else {
        return Ok(Policy::default());
    };

    let contents = fs::read_to_string(path).map_err(|e| Error::file(path.to_path_buf(), e))?;
    let policy = toml::from_str(&contents).map_err(|error| Error::Policy {
        path: path.to_path_buf(),
        error,
    })?;

    tracing::debug!(path = %path.display(), ?policy, "loaded policy");

    Ok(policy)
}

#[cfg(test)]
mod tests {
    use energy_invoice::policy::Policy;

    #[test]
    fn partial_policy_keeps_defaults() {
        let policy: Policy = toml::from_str(
            r#"
            advisor_window = 6

            [[voltage_counterparts]]
            single = "AG"
            dual = "OG"
            "#,
        )
        .unwrap();

        let defaults = Policy::default();
        assert_eq!(policy.advisor_window, 6);
        assert_eq!(policy.inductive_limit_percent, defaults.inductive_limit_percent);
        assert_eq!(policy.time_zone, defaults.time_zone);
        assert_eq!(policy.voltage_counterparts.len(), 1);
    }
}
