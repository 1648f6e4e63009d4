use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Editor features an integration may opt into.
///
/// Diagnostics are not listed; every integration publishes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, EnumString, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum OptionalCapability {
    /// `textDocument/completion`.
    Completion,
    /// `textDocument/definition`.
    #[strum(to_string = "go-to-definition", serialize = "definition")]
    #[serde(rename = "go-to-definition")]
    GoToDefinition,
}

/// Opt-in switches for the optional capabilities. Both default to off.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CapabilityToggles {
    /// Whether completion requests may be routed to the backend.
    pub completion: bool,
    /// Whether go-to-definition requests may be routed to the backend.
    pub goto_definition: bool,
}

impl CapabilityToggles {
    /// Returns whether the supplied capability is switched on.
    #[must_use]
    pub fn is_enabled(self, capability: OptionalCapability) -> bool {
        match capability {
            OptionalCapability::Completion => self.completion,
            OptionalCapability::GoToDefinition => self.goto_definition,
        }
    }

    /// Switches the supplied capability on.
    pub fn enable(&mut self, capability: OptionalCapability) {
        match capability {
            OptionalCapability::Completion => self.completion = true,
            OptionalCapability::GoToDefinition => self.goto_definition = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn toggles_default_to_off() {
        let toggles = CapabilityToggles::default();

        assert!(!toggles.is_enabled(OptionalCapability::Completion));
        assert!(!toggles.is_enabled(OptionalCapability::GoToDefinition));
    }

    #[rstest]
    #[case("completion", OptionalCapability::Completion)]
    #[case("go-to-definition", OptionalCapability::GoToDefinition)]
    #[case("Definition", OptionalCapability::GoToDefinition)]
    fn parses_capability_names(#[case] input: &str, #[case] expected: OptionalCapability) {
        assert_eq!(
            OptionalCapability::from_str(input).expect("capability"),
            expected
        );
    }

    #[rstest]
    fn enabling_one_capability_leaves_the_other_off() {
        let mut toggles = CapabilityToggles::default();
        toggles.enable(OptionalCapability::Completion);

        assert!(toggles.completion);
        assert!(!toggles.goto_definition);
    }
}
