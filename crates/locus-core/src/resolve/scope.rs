//! Scope-chain walking: which function does an address belong to, and which
//! inline expansions produced it.
//!
//! Scope lists come from the provider innermost-first and end with the
//! compile unit. Lexical blocks and other code-carrying scopes are walked
//! through but never name anything.

use crate::config::ResolverConfig;
use crate::provider::{DebugInfoProvider, Module, ScopeId, ScopeNode};
use crate::types::{FunctionIdentity, IdentityKind, InlineFrame, ScopeTag};

/// Placeholder for a function scope without any name attribute.
pub const UNKNOWN_NAME: &str = "??";

/// The function owning `address`, according to debug info.
///
/// `None` means no subprogram (or, in pretty mode, no inline) covers the
/// address; that includes modules without debug info.
pub fn resolve_function<P>(provider: &P, module: &Module, address: u64, config: &ResolverConfig) -> Option<FunctionIdentity>
where
    P: DebugInfoProvider + ?Sized,
{
    identify(&covering_scopes(provider, module, address), config.pretty)
}

/// Scopes covering `address`, innermost first. Empty when the address is in
/// no compile unit.
pub fn covering_scopes<P>(provider: &P, module: &Module, address: u64) -> Vec<ScopeNode>
where
    P: DebugInfoProvider + ?Sized,
{
    provider
        .compile_unit_at(module.id, address)
        .map(|unit| provider.scopes_covering(unit, address))
        .unwrap_or_default()
}

/// Walk an innermost-first scope list and pick the function identity.
///
/// A subprogram always ends the walk. In pretty mode the first inline also
/// ends it; in verbose mode inlines are passed through, collecting their call
/// sites, until the enclosing subprogram is reached.
pub fn identify(scopes: &[ScopeNode], pretty: bool) -> Option<FunctionIdentity>
{
    let mut call_sites = Vec::new();

    for scope in scopes {
        match scope.tag {
            ScopeTag::Subprogram => {
                return Some(FunctionIdentity {
                    name: display_name(scope),
                    kind: IdentityKind::Subprogram,
                    call_sites,
                });
            }
            ScopeTag::InlinedSubroutine if pretty => {
                return Some(FunctionIdentity {
                    name: display_name(scope),
                    kind: IdentityKind::InlinedSubroutine,
                    call_sites,
                });
            }
            ScopeTag::InlinedSubroutine => call_sites.extend(scope.call_site.clone()),
            ScopeTag::EntryPoint | ScopeTag::LexicalBlock | ScopeTag::Other => {}
        }
    }

    None
}

/// Inline expansion chain for the scope tree rooted at `innermost`,
/// innermost first.
///
/// Every inlined subroutine except the outermost entry of the tree becomes
/// one frame. Its caller is the nearest enclosing inline, entry point or
/// subprogram, reported only when `with_callers` is set.
pub fn inline_chain<P>(provider: &P, innermost: ScopeId, with_callers: bool) -> Vec<InlineFrame>
where
    P: DebugInfoProvider + ?Sized,
{
    let tree = provider.full_scope_tree_of(innermost);
    let Some(outermost) = tree.len().checked_sub(1) else {
        return Vec::new();
    };

    tree[..outermost]
        .iter()
        .enumerate()
        .filter(|(_, scope)| scope.tag == ScopeTag::InlinedSubroutine)
        .map(|(index, scope)| InlineFrame {
            name: display_name(scope),
            caller: if with_callers {
                caller_of(&tree[index + 1..])
            } else {
                None
            },
            call_site: scope.call_site.clone(),
        })
        .collect()
}

fn caller_of(enclosing: &[ScopeNode]) -> Option<String>
{
    enclosing
        .iter()
        .find(|scope| {
            matches!(
                scope.tag,
                ScopeTag::InlinedSubroutine | ScopeTag::EntryPoint | ScopeTag::Subprogram
            )
        })
        .map(display_name)
}

fn display_name(scope: &ScopeNode) -> String
{
    scope.name.clone().unwrap_or_else(|| UNKNOWN_NAME.to_owned())
}
