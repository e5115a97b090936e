/*!
 * Narration generation from analyzed subtitles.
 *
 * - `request`: perspective, style and audience
 * - `prompts`: prompt construction with tone and register tables
 * - `cascade`: sequential backend attempts with per-call timeouts
 * - `template`: deterministic fallback script
 * - `segments`: parsing generated text back into timed segments
 * - `generator`: the end-to-end `NarrationGenerator`
 */

pub mod cascade;
pub mod generator;
pub mod prompts;
pub mod request;
pub mod segments;
pub mod template;

pub use cascade::{BackendCascade, CascadeOutcome, GeneratedText};
pub use generator::{NarrationGenerator, NarrationMetadata, NarrationResult, TEMPLATE_SERVICE};
pub use request::{NarrationMode, NarrationRequest, NarrationStyle, TargetAudience};
pub use segments::NarrationSegmentParser;
pub use template::TemplateNarrator;
