//! The transfer syntaxes supported by this toolkit.

use std::fmt;

/// A supported transfer syntax, selecting how element headers and
/// values are laid out in a stream.
///
/// This is a closed enumeration: compressed and big-endian syntaxes are
/// not supported, and files declaring them are rejected at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferSyntax {
    /// Implicit VR Little Endian, the default transfer syntax.
    ImplicitVRLittleEndian,
    /// Explicit VR Little Endian.
    ExplicitVRLittleEndian,
}

impl TransferSyntax {
    /// The unique identifier registered for this transfer syntax.
    pub fn uid(self) -> &'static str {
        match self {
            TransferSyntax::ImplicitVRLittleEndian => "1.2.840.10008.1.2",
            TransferSyntax::ExplicitVRLittleEndian => "1.2.840.10008.1.2.1",
        }
    }

    /// Resolve a transfer syntax from its unique identifier.
    /// Trailing padding characters in the UID are ignored.
    pub fn from_uid(uid: &str) -> Option<Self> {
        match uid.trim_end_matches(['\0', ' ']) {
            "1.2.840.10008.1.2" => Some(TransferSyntax::ImplicitVRLittleEndian),
            "1.2.840.10008.1.2.1" => Some(TransferSyntax::ExplicitVRLittleEndian),
            _ => None,
        }
    }
}

impl fmt::Display for TransferSyntax {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TransferSyntax::ImplicitVRLittleEndian => "Implicit VR Little Endian",
            TransferSyntax::ExplicitVRLittleEndian => "Explicit VR Little Endian",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uid_round_trip() {
        for ts in [
            TransferSyntax::ImplicitVRLittleEndian,
            TransferSyntax::ExplicitVRLittleEndian,
        ] {
            assert_eq!(TransferSyntax::from_uid(ts.uid()), Some(ts));
        }
    }

    #[test]
    fn padded_uids_resolve() {
        assert_eq!(
            TransferSyntax::from_uid("1.2.840.10008.1.2.1\0"),
            Some(TransferSyntax::ExplicitVRLittleEndian)
        );
        assert_eq!(TransferSyntax::from_uid("1.2.840.10008.1.2.4.50"), None);
    }
}
