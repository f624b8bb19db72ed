pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod nats;
pub mod relay;
pub mod session;
pub mod timing;
pub mod translation;

pub use audio::AudioChunk;
pub use config::Config;
pub use error::{SessionError, SessionResult};
pub use http::{create_router, AppState};
pub use relay::Relay;
pub use session::{Inbound, Session, SessionConfig, SessionManager, SessionStatus, Transport};
pub use timing::{Stage, Subscription, SubscriptionId, TimingBus, TimingEvent};
pub use translation::{
    LoopbackService, NatsTranslationService, StreamCallbacks, TranslationService,
    TranslationServiceFactory,
};
