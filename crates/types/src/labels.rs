//! Request constraint enums and their canonical string labels
//!
//! Each table is a bijection: the string produced for a value parses back to
//! the same value. The strings are what the distribution service matches on,
//! so they must not change.
//!
//! On the caller schema each value is written as its snake_case name. Reading
//! also accepts the canonical label. An unknown tier or group is an error,
//! while an unknown variant degrades to [`Variant::Unspecified`].

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Find the value whose snake_case name is `raw`, then the one whose label is.
fn parse_name_or_label<T: Copy>(
    all: &[T],
    name: fn(T) -> &'static str,
    label: impl FnOnce(&str) -> Option<T>,
    raw: &str,
) -> Option<T> {
    all.iter().copied().find(|value| name(*value) == raw).or_else(|| label(raw))
}

macro_rules! serialize_as_name {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.name())
            }
        }
    };
}

/// Performance class of the requesting device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DeviceTier {
    #[default]
    Unknown,
    UltraLow,
    Low,
    Mid,
    High,
    Ultra,
}

impl DeviceTier {
    pub const ALL: [DeviceTier; 6] = [
        Self::Unknown,
        Self::UltraLow,
        Self::Low,
        Self::Mid,
        Self::High,
        Self::Ultra,
    ];

    pub const NAMES: [&'static str; 6] = ["unknown", "ultra_low", "low", "mid", "high", "ultra"];

    /// Name on the caller schema
    #[must_use]
    pub const fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    #[must_use]
    pub const fn as_label(self) -> &'static str {
        match self {
            Self::Unknown => "",
            Self::UltraLow => "Ultra Low",
            Self::Low => "Low",
            Self::Mid => "Mid",
            Self::High => "High",
            Self::Ultra => "Ultra",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.as_label() == label)
    }
}

serialize_as_name!(DeviceTier);

impl<'de> Deserialize<'de> for DeviceTier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_name_or_label(&Self::ALL, Self::name, Self::from_label, &raw)
            .ok_or_else(|| D::Error::unknown_variant(&raw, &Self::NAMES))
    }
}

impl clap::ValueEnum for DeviceTier {
    fn value_variants<'a>() -> &'a [Self] {
        &Self::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Unknown => clap::builder::PossibleValue::new("unknown"),
            Self::UltraLow => clap::builder::PossibleValue::new("ultra-low"),
            Self::Low => clap::builder::PossibleValue::new("low"),
            Self::Mid => clap::builder::PossibleValue::new("mid"),
            Self::High => clap::builder::PossibleValue::new("high"),
            Self::Ultra => clap::builder::PossibleValue::new("ultra"),
        })
    }
}

/// Release channel the client belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ClientGroup {
    #[default]
    All,
    Beta,
    Alpha,
    ThirdPartyEap,
}

impl ClientGroup {
    pub const ALL: [ClientGroup; 4] = [Self::All, Self::Beta, Self::Alpha, Self::ThirdPartyEap];
    pub const NAMES: [&'static str; 4] = ["all", "beta", "alpha", "third_party_eap"];

    /// Name on the caller schema
    #[must_use]
    pub const fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    #[must_use]
    pub const fn as_label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Beta => "beta",
            Self::Alpha => "alpha",
            Self::ThirdPartyEap => "third_party_eap",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|group| group.as_label() == label)
    }
}

serialize_as_name!(ClientGroup);

impl<'de> Deserialize<'de> for ClientGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_name_or_label(&Self::ALL, Self::name, Self::from_label, &raw)
            .ok_or_else(|| D::Error::unknown_variant(&raw, &Self::NAMES))
    }
}

impl clap::ValueEnum for ClientGroup {
    fn value_variants<'a>() -> &'a [Self] {
        &Self::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_label()))
    }
}

/// Hardware variant of the requesting device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Variant {
    #[default]
    Unspecified,
    Oem,
    Reference,
    VendorQc,
    VendorSlsi,
}

impl Variant {
    pub const ALL: [Variant; 5] = [
        Self::Unspecified,
        Self::Oem,
        Self::Reference,
        Self::VendorQc,
        Self::VendorSlsi,
    ];
    pub const NAMES: [&'static str; 5] =
        ["unspecified", "oem", "reference", "vendor_qc", "vendor_slsi"];

    /// Name on the caller schema
    #[must_use]
    pub const fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    #[must_use]
    pub const fn as_label(self) -> &'static str {
        match self {
            Self::Unspecified => "",
            Self::Oem => "OEM",
            Self::Reference => "REFERENCE",
            Self::VendorQc => "VENDOR_QC",
            Self::VendorSlsi => "VENDOR_SLSI",
        }
    }

    /// Parse a variant label. Unknown labels are logged and treated as absent.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let found = Self::ALL.into_iter().find(|v| v.as_label() == label);
        if found.is_none() {
            tracing::warn!(variant = label, "unknown variant label, ignoring");
        }
        found
    }

    #[must_use]
    pub const fn is_specified(self) -> bool {
        !matches!(self, Self::Unspecified)
    }
}

serialize_as_name!(Variant);

impl<'de> Deserialize<'de> for Variant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let variant = parse_name_or_label(&Self::ALL, Self::name, Self::from_label, &raw);
        Ok(variant.unwrap_or_default())
    }
}

impl clap::ValueEnum for Variant {
    fn value_variants<'a>() -> &'a [Self] {
        &Self::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Unspecified => clap::builder::PossibleValue::new("unspecified"),
            Self::Oem => clap::builder::PossibleValue::new("oem"),
            Self::Reference => clap::builder::PossibleValue::new("reference"),
            Self::VendorQc => clap::builder::PossibleValue::new("vendor-qc"),
            Self::VendorSlsi => clap::builder::PossibleValue::new("vendor-slsi"),
        })
    }
}

/// An attribute/value pair attached to the external constraints
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    pub attribute: String,
    pub value: String,
}

impl Label {
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attribute, self.value)
    }
}
