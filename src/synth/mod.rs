// Purpose: Voice construction, control messages and the monophonic engine
// This layer sits above graph nodes and owns the single active voice

pub mod factory;
pub mod message;
pub mod mono;
pub mod voice;

pub use factory::{PatchVoices, VoiceFactory};
pub use message::{MessageReceiver, SynthMessage};
#[cfg(feature = "rtrb")]
pub use mono::{channel, SynthHandle};
pub use mono::MonoSynth;
pub use voice::Voice;
