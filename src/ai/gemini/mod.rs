#[cfg(test)]
macro_rules! impl_with_gemini_base_url {
    ($client:ty) => {
        impl $client {
            pub(crate) fn with_base_url(mut self, base_url: String) -> Self {
                self.http = self.http.with_base_url(base_url);
                self
            }
        }
    };
}

#[cfg(test)]
pub(crate) use impl_with_gemini_base_url;

pub mod client;
pub mod image;
pub mod speech;
pub mod structure;
pub mod types;

pub use image::GeminiImageClient;
pub use speech::GeminiSpeechClient;
pub use structure::GeminiStructureClient;
