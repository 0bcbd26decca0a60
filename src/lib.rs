//! # Darkroom
//!
//! Raster image editing core: per-pixel filters over RGBA buffers, a preset
//! catalog that drives them, a concurrency-bounded batch runner for file
//! transforms, and structural operations over editor layer stacks.
//!
//! # Data Flow
//!
//! ```text
//! preset id ──create_filter_state──▶ FilterState ──apply_filter──▶ PixelBuffer
//!
//! [BatchOperation] ──process_batch──▶ TransformBackend (k at a time) ──▶ BatchProcessingResult
//!
//! [EditorLayer] ──merge / duplicate / reorder──▶ [EditorLayer]
//! ```
//!
//! The filter path and the batch path are independent. Layers are plain data
//! handed in and returned by value.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pixels`] | Owned RGBA buffer and the pure filter algorithms |
//! | [`presets`] | Static preset catalog, `FilterState`, `apply_filter` |
//! | [`transform`] | Backend trait for resize/crop/compress/convert, URI validation, the `image`-based backend |
//! | [`batch`] | Chunked parallel execution of batch operations with per-item failure isolation |
//! | [`layers`] | Merge, duplicate and reorder over layer stacks |
//! | [`config`] | `darkroom.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Buffers Are Never Mutated In Place
//!
//! Every filter borrows its input and returns a new [`pixels::PixelBuffer`].
//! Callers can keep the original for blending, undo, or side-by-side display
//! without copying it first.
//!
//! ## Enum Dispatch For Filters
//!
//! Presets name an algorithm through [`presets::FilterKind`]. Several presets
//! share one algorithm (grayscale is saturation at -100, sepia is vintage at
//! full strength), and a new algorithm is a new variant the compiler forces
//! every `match` to handle.
//!
//! ## Bounded Batches On Rayon
//!
//! Batch operations run in consecutive chunks of `concurrency` items on the
//! rayon pool. Results are folded into the report on the calling thread, so
//! the progress counter never needs synchronization.
//!
//! ## Trait-Based Backend
//!
//! File transforms go through [`transform::TransformBackend`]. The shipped
//! [`transform::RustBackend`] uses the `image` crate; tests substitute a
//! recording mock to check ordering and concurrency without touching disk.

pub mod batch;
pub mod config;
pub mod layers;
pub mod output;
pub mod pixels;
pub mod presets;
pub mod transform;
