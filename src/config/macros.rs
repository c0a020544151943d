/// Configuration macros for zero-repetition config definitions
///
/// `config_struct!` declares a configuration section with embedded defaults
/// in a single place and generates:
/// - The struct with public fields
/// - The Default implementation built from the declared values
/// - Serde support with `#[serde(default)]`, so partial TOML files work
///
/// # Example
/// ```
/// game_stats_exporter::config_struct! {
///     pub struct ServerConfig {
///         host: String = "0.0.0.0".to_string(),
///         port: u16 = 8000,
///     }
/// }
///
/// let cfg: ServerConfig = toml::from_str("port = 9000").unwrap();
/// assert_eq!(cfg.port, 9000);
/// assert_eq!(cfg.host, "0.0.0.0");
/// ```
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
