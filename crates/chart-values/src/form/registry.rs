//! The registry of well-known chart value names.
//!
//! Charts across repositories converge on a handful of property names for
//! credentials, resource sizing and optional subsystems. The basic form
//! gives these a richer widget than their declared primitive type would.
//! Adding a well-known field is a data change here, not a control-flow
//! change in the synthesizer.

/// Hard-coded numeric range and unit for a slider-rendered field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliderSpec {
    pub min: u64,
    pub max: u64,
    pub unit: &'static str,
}

/// How a well-known property renders, plus its fixed display title.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum KnownField {
    Text {
        title: &'static str,
    },
    Slider {
        title: &'static str,
        spec: SliderSpec,
    },
    /// An expandable subsection whose nested fields are toggled by the value
    /// found at `enabler_path` matching `enabler_condition`.
    Subsection {
        title: &'static str,
        enabler_path: &'static str,
        enabler_condition: bool,
    },
}

const KNOWN_FIELDS: &[(&str, KnownField)] = &[
    ("username", KnownField::Text { title: "Username" }),
    ("password", KnownField::Text { title: "Password" }),
    ("email", KnownField::Text { title: "Email" }),
    ("hostname", KnownField::Text { title: "Hostname" }),
    (
        "diskSize",
        KnownField::Slider {
            title: "Disk Size",
            spec: SliderSpec {
                min: 1,
                max: 100,
                unit: "Gi",
            },
        },
    ),
    (
        "memoryRequest",
        KnownField::Slider {
            title: "Memory Request",
            spec: SliderSpec {
                min: 10,
                max: 2048,
                unit: "Mi",
            },
        },
    ),
    (
        "cpuRequest",
        KnownField::Slider {
            title: "CPU Request",
            spec: SliderSpec {
                min: 100,
                max: 2000,
                unit: "m",
            },
        },
    ),
    (
        "externalDatabase",
        KnownField::Subsection {
            title: "External Database Details",
            // The section applies when the chart's embedded database is off
            enabler_path: "mariadb.enabled",
            enabler_condition: false,
        },
    ),
];

pub(crate) fn lookup(name: &str) -> Option<KnownField> {
    KNOWN_FIELDS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, field)| *field)
}
