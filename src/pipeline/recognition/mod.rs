pub mod http;
pub mod recognizer;
pub mod service;

pub use http::HttpRecognizer;
pub use recognizer::{RecognitionResult, Recognizer};
pub use service::{BoxRecognitionService, RecognitionService, recognition_stack};
