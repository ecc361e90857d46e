//! Macro for port error enums whose variants each carry a detail message.

/// Declare a `thiserror` enum where every variant holds `message: String`.
///
/// Each variant also gets a snake-case constructor taking
/// `impl Into<String>`, so adapters can write `TransportError::timeout(e)`.
macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $display:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($display)]
                $variant {
                    /// Detail reported by the adapter.
                    message: String,
                },
            )*
        }

        impl $name {
            $(
                ::paste::paste! {
                    #[doc = "Construct the `" $variant "` variant."]
                    #[must_use]
                    pub fn [<$variant:snake>](message: impl Into<String>) -> Self {
                        Self::$variant {
                            message: message.into(),
                        }
                    }
                }
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    define_port_error! {
        pub enum UplinkError {
            Refused => "refused: {message}",
            DnsFailure => "lookup failed: {message}",
        }
    }

    #[rstest]
    #[case(UplinkError::refused("port 443"), "refused: port 443")]
    #[case(UplinkError::dns_failure(String::from("no such host")), "lookup failed: no such host")]
    fn constructors_fill_the_message(#[case] err: UplinkError, #[case] expected: &str) {
        assert_eq!(err.to_string(), expected);
    }

    #[rstest]
    fn equal_messages_compare_equal() {
        assert_eq!(
            UplinkError::refused("x"),
            UplinkError::Refused {
                message: "x".to_owned()
            }
        );
    }
}
