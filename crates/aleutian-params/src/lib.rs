// ABOUTME: Parameter Extractor (C3): the tool-name switch that builds typed
// ABOUTME: parameters from analyzer candidates and resolver output (spec.md §4.3)

pub mod extractor;
pub mod refinement;
pub mod types;

pub use extractor::extract_params;
pub use refinement::refine_with_llm;
pub use types::{
    categorize, EmptyParams, GrepParams, OutputMode, Resolution, SingleFunctionParams,
    ToolCategory, TopNParams, TwoEndpointParams, TypedParams,
};
