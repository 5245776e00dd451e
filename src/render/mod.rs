//! Render/label engine
//!
//! Label computation is a pure function of a timer's name, state and time
//! left. The [`Renderer`] sits between the runtime and a [`Surface`] and
//! suppresses writes whose text matches what is already displayed.

pub mod label;
pub mod surface;

pub use label::{format_remaining, label_for, Label};
pub use surface::{Renderer, Surface, TerminalSurface};
