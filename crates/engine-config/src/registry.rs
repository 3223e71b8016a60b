//! Names of the pluggable components, resolved once at startup.

use crate::error::ConfigError;

pub trait ComponentKind: Sized + Copy + 'static {
    /// Property selecting the component.
    const KEY: &'static str;
    /// Accepted names, first entry of each pair is canonical.
    const NAMES: &'static [(&'static str, Self)];
    const DEFAULT: Self;

    fn name(&self) -> &'static str;
}

/// Resolves an optional component name; blank means the default.
pub fn resolve<K: ComponentKind>(value: Option<&str>) -> Result<K, ConfigError> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(K::DEFAULT);
    };

    K::NAMES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(raw))
        .map(|(_, kind)| *kind)
        .ok_or_else(|| ConfigError::UnknownComponent {
            key: K::KEY.to_string(),
            value: raw.to_string(),
            expected: expected_names::<K>(),
        })
}

fn expected_names<K: ComponentKind>() -> String {
    let mut names: Vec<&str> = K::NAMES.iter().map(|(name, _)| *name).collect();
    names.dedup();
    names.join(", ")
}

macro_rules! component_kind {
    (
        $(#[$meta:meta])*
        $kind:ident, key = $key:literal, default = $default:ident,
        { $($variant:ident => [$canonical:literal $(, $alias:literal)*]),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $kind {
            $($variant),+
        }

        impl ComponentKind for $kind {
            const KEY: &'static str = $key;
            const NAMES: &'static [(&'static str, Self)] = &[
                $(($canonical, $kind::$variant), $(($alias, $kind::$variant),)*)+
            ];
            const DEFAULT: Self = $kind::$default;

            fn name(&self) -> &'static str {
                match self {
                    $($kind::$variant => $canonical),+
                }
            }
        }

        impl std::fmt::Display for $kind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

component_kind!(
    RequestFactoryKind, key = "http.request.factory", default = Template,
    { Template => ["template", "offset-template"] }
);

component_kind!(
    ClientKind, key = "http.client", default = Reqwest,
    { Reqwest => ["reqwest", "okhttp"] }
);

component_kind!(
    AuthKind, key = "http.auth.type", default = None,
    { None => ["none"], Basic => ["basic"] }
);

component_kind!(
    ThrottlerKind, key = "http.throttler", default = Adaptive,
    { Fixed => ["fixed"], Adaptive => ["adaptive"] }
);

component_kind!(
    ParserKind, key = "http.response.parser", default = StatusCodeFilter,
    { StatusCodeFilter => ["status-code-filter"], Json => ["json"] }
);

component_kind!(
    FilterKind, key = "http.record.filter.factory", default = Passthrough,
    { Passthrough => ["passthrough"], OffsetTimestamp => ["offset-timestamp"] }
);

component_kind!(
    /// How records sharing the offset's boundary timestamp are treated.
    TieBreak, key = "http.record.filter.tiebreak", default = None,
    { None => ["none"], Key => ["key"] }
);

component_kind!(
    MapperKind, key = "http.record.mapper", default = Schemed,
    { Schemed => ["schemed"], StringKv => ["string-kv"] }
);
