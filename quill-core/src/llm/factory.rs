use super::provider::WireFormat;
use super::providers::{GeminiProvider, OpenAIProvider};
use crate::config::constants::urls;
use crate::config::{ProviderKind, ServerDefinition};

/// The closed set of wire formats a server can speak
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormatKind {
    GeminiNative,
    OpenAICompatible,
}

impl WireFormatKind {
    /// Pick the wire format for a server definition.
    ///
    /// The provider decides by default; an endpoint URL can override it in
    /// either direction (Gemini's OpenAI-compatible endpoint, or a native
    /// `generateContent` URL configured on another provider).
    pub fn select(server: &ServerDefinition) -> Self {
        let hint = server.endpoint_hint().unwrap_or_default();
        match server.provider {
            ProviderKind::Gemini if hint.contains(urls::OPENAI_COMPAT_MARKER) => {
                WireFormatKind::OpenAICompatible
            }
            ProviderKind::Gemini => WireFormatKind::GeminiNative,
            _ if hint.contains(urls::GEMINI_NATIVE_MARKER) => WireFormatKind::GeminiNative,
            _ => WireFormatKind::OpenAICompatible,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WireFormatKind::GeminiNative => "gemini-native",
            WireFormatKind::OpenAICompatible => "openai-compatible",
        }
    }
}

/// Type-erased wire format
pub type AnyProvider = Box<dyn WireFormat>;

/// Create the wire format for a server definition
pub fn make_provider(server: &ServerDefinition) -> AnyProvider {
    match WireFormatKind::select(server) {
        WireFormatKind::GeminiNative => Box::new(GeminiProvider::from_server(server)),
        WireFormatKind::OpenAICompatible => Box::new(OpenAIProvider::from_server(server)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(provider: ProviderKind, url: Option<&str>, api_base: Option<&str>) -> ServerDefinition {
        let mut server = ServerDefinition::new(provider, "m");
        server.url = url.map(str::to_string);
        server.api_base = api_base.map(str::to_string);
        server
    }

    #[test]
    fn provider_decides_by_default() {
        assert_eq!(
            WireFormatKind::select(&server(ProviderKind::Gemini, None, None)),
            WireFormatKind::GeminiNative
        );
        for provider in [ProviderKind::OpenAI, ProviderKind::Custom, ProviderKind::Ollama] {
            assert_eq!(
                WireFormatKind::select(&server(provider, None, None)),
                WireFormatKind::OpenAICompatible
            );
        }
    }

    #[test]
    fn gemini_openai_endpoint_switches_format() {
        let def = server(
            ProviderKind::Gemini,
            None,
            Some("https://generativelanguage.googleapis.com/v1beta/openai/"),
        );
        assert_eq!(WireFormatKind::select(&def), WireFormatKind::OpenAICompatible);
        assert_eq!(make_provider(&def).name(), "openai");
    }

    #[test]
    fn native_endpoint_on_custom_provider_switches_format() {
        let def = server(
            ProviderKind::Custom,
            Some("https://proxy.example.com/v1beta/models/m:generateContent"),
            None,
        );
        assert_eq!(WireFormatKind::select(&def), WireFormatKind::GeminiNative);
        let provider = make_provider(&def);
        assert_eq!(provider.name(), "gemini");
        assert!(provider.context_cache().is_some());
    }
}
