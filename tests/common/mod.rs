//! Shared helpers for integration tests
//!
//! - building contexts with a given configuration
//! - folding a listing in one call

#![allow(dead_code)]

use std::sync::Arc;

use dexsimplify::config::DiagnosticPolicy;
use dexsimplify::{
    parse_listing, prepare_method, MethodState, OpHandlerFactory, SimplifyConfig, VmContext,
};

/// Descriptor used by tests that do not care about method names
pub const TEST_METHOD: &str = "Lcom/example/Obf;->decode()I";

pub fn context(config: SimplifyConfig) -> VmContext {
    VmContext::new(TEST_METHOD, Arc::new(config))
}

/// Configuration that folds const instructions
pub fn folding_config() -> SimplifyConfig {
    SimplifyConfig::default().with_constant_folding()
}

/// Folding configuration that records diagnostics without logging them
pub fn quiet_config() -> SimplifyConfig {
    SimplifyConfig {
        unimplemented_policy: DiagnosticPolicy::Ignore,
        not_wired_policy: DiagnosticPolicy::Ignore,
        ..folding_config()
    }
}

/// Parse, prepare and run a straight-line listing, returning the final state
pub fn fold(source: &str, registers: usize) -> MethodState {
    let insns = parse_listing(source).expect("listing should parse");
    let ctx = context(quiet_config());
    let prepared =
        prepare_method(&OpHandlerFactory::new(), &ctx, &insns).expect("method should prepare");
    let mut state = ctx.new_state(registers).expect("register limit");
    prepared
        .execute_straight_line(&mut state)
        .expect("straight-line execution");
    state
}
