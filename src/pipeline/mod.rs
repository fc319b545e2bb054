//! Normalization stages for patch-note fragments.
//!
//! Each submodule implements exactly one transformation over a
//! [`crate::dom::Fragment`]. Stages mutate the tree in place; each stage's
//! output is the next stage's precondition, so the order is fixed and owned
//! by [`crate::normalize`].
//!
//! ## Data Flow
//!
//! ```text
//! cleanup ──▶ collapse ──▶ list ──▶ cleanup ──▶ classify ──▶ heading ──▶ extract
//! (img/span)  (div)        (ul)     (p attrs)   (span?)      (h3/h4)     (split p)
//! ```
//!
//! 1. [`cleanup`]  — drop images, flatten decorative spans, strip paragraph
//!    styling and re-tag legacy bold
//! 2. [`collapse`] — resolve generic `div` wrappers by child arity
//! 3. [`list`]     — fold runs of indented paragraphs into bullet lists
//! 4. [`classify`] — decide whether a heading-marker span is a heading; pure
//! 5. [`heading`]  — replace a classified span with `h3`/`h4`
//! 6. [`extract`]  — split paragraphs around the headings placed inside them

pub mod classify;
pub mod cleanup;
pub mod collapse;
pub mod extract;
pub mod heading;
pub mod list;
