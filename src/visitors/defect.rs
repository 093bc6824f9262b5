use std::collections::HashMap;

use quote::ToTokens;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::token::Comma;
use syn::{
    visit::{self, Visit},
    Expr, ExprCall, ImplItemFn, ItemFn, Lit, Local, Pat,
};

use crate::models::{DefectKind, Finding, Severity};

// Calls that move a heap allocation out of ownership tracking
const LEAK_SIGNATURES: &[&str] = &[
    "Box::into_raw",
    "Box::leak",
    "mem::forget",
    "ManuallyDrop::new",
    "alloc::alloc",
];

// Calls that hand an escaped allocation back to a releasing owner
const RECLAIM_SIGNATURES: &[&str] = &[
    "Box::from_raw",
    "alloc::dealloc",
    "ManuallyDrop::drop",
    "ptr::drop_in_place",
];

// Unbounded copy primitives with (src, dst, count) arguments
const COPY_SIGNATURES: &[&str] = &["ptr::copy", "ptr::copy_nonoverlapping"];

/// Visitor that flags the two fixture defect classes in a parsed source
/// file: heap allocations that escape ownership with no matching release in
/// the same function, and raw copies whose statically-known length exceeds
/// the capacity of a local fixed-size array destination.
pub struct DefectVisitor {
    pub findings: Vec<Finding>,
    current_fn: Option<FnContext>,
}

// Per-function scan state, reset at every function boundary
struct FnContext {
    name: String,
    source: String,
    array_capacities: HashMap<String, usize>, // local ident -> [T; N] capacity
    literal_lengths: HashMap<String, usize>,  // local ident -> byte-string length
    alloc_sites: Vec<(usize, String)>,        // line, escaping call path
    overflow_sites: Vec<OverflowSite>,
    has_reclaim: bool,
}

struct OverflowSite {
    line: usize,
    dest: String,
    copied: usize,
    capacity: usize,
}

impl FnContext {
    fn new(name: String, source: String) -> Self {
        FnContext {
            name,
            source,
            array_capacities: HashMap::new(),
            literal_lengths: HashMap::new(),
            alloc_sites: Vec::new(),
            overflow_sites: Vec::new(),
            has_reclaim: false,
        }
    }
}

impl DefectVisitor {
    pub fn new() -> Self {
        DefectVisitor {
            findings: Vec::new(),
            current_fn: None,
        }
    }

    fn enter_function(&mut self, name: String, source: String) -> Option<FnContext> {
        self.current_fn.replace(FnContext::new(name, source))
    }

    fn leave_function(&mut self, parent: Option<FnContext>) {
        if let Some(ctx) = self.current_fn.take() {
            self.finish_function(ctx);
        }
        self.current_fn = parent;
    }

    /// Turn the accumulated per-function state into findings. A reclaim
    /// call anywhere in the function clears its leak candidates; overflow
    /// sites are unconditional.
    fn finish_function(&mut self, ctx: FnContext) {
        if !ctx.has_reclaim {
            for (line, callee) in &ctx.alloc_sites {
                self.findings.push(Finding {
                    kind: DefectKind::MemoryLeak,
                    severity: Severity::Error,
                    message: format!(
                        "heap allocation escapes `{}` via `{}` with no matching release",
                        ctx.name, callee
                    ),
                    line: Some(*line),
                    snippet: Some(ctx.source.clone()),
                });
            }
        }

        for site in &ctx.overflow_sites {
            self.findings.push(Finding {
                kind: DefectKind::BufferOverflow,
                severity: Severity::Error,
                message: format!(
                    "copy of {} bytes into `{}` (capacity {}) in `{}` writes past its end",
                    site.copied, site.dest, site.capacity, ctx.name
                ),
                line: Some(site.line),
                snippet: Some(ctx.source.clone()),
            });
        }
    }

    fn handle_call(&mut self, callee: &str, args: &Punctuated<Expr, Comma>, line: usize) {
        let Some(ctx) = self.current_fn.as_mut() else {
            return; // call outside any function body, e.g. a const initializer
        };

        if matches_signature(callee, RECLAIM_SIGNATURES) {
            ctx.has_reclaim = true;
            return;
        }

        if matches_signature(callee, LEAK_SIGNATURES) {
            ctx.alloc_sites.push((line, callee.to_string()));
            return;
        }

        if matches_signature(callee, COPY_SIGNATURES) && args.len() == 3 {
            let dest = pointer_receiver(&args[1]);
            let copied = Self::copy_length(ctx, &args[2]);
            if let (Some(dest), Some(copied)) = (dest, copied) {
                if let Some(capacity) = ctx.array_capacities.get(&dest).copied() {
                    if copied > capacity {
                        ctx.overflow_sites.push(OverflowSite {
                            line,
                            dest,
                            copied,
                            capacity,
                        });
                    }
                }
            }
        }
    }

    // Resolve the count argument: an integer literal, or `ident.len()` of a
    // byte-string local recorded earlier in the function
    fn copy_length(ctx: &FnContext, expr: &Expr) -> Option<usize> {
        if let Some(value) = int_literal(expr) {
            return Some(value);
        }
        if let Expr::MethodCall(call) = expr {
            if call.method == "len" && call.args.is_empty() {
                if let Some(ident) = path_ident(&call.receiver) {
                    return ctx.literal_lengths.get(&ident).copied();
                }
            }
        }
        None
    }

    fn record_local(&mut self, local: &Local) {
        let Some(ctx) = self.current_fn.as_mut() else {
            return;
        };
        let Pat::Ident(pat) = &local.pat else {
            return;
        };
        let Some(init) = &local.init else {
            return;
        };

        let name = pat.ident.to_string();
        match &*init.expr {
            // [0u8; 10]
            Expr::Repeat(repeat) => {
                if let Some(capacity) = int_literal(&repeat.len) {
                    ctx.array_capacities.insert(name, capacity);
                }
            }
            // [a, b, c]
            Expr::Array(array) => {
                ctx.array_capacities.insert(name, array.elems.len());
            }
            // b"..." carries its length, terminator included
            Expr::Lit(lit) => {
                if let Lit::ByteStr(bytes) = &lit.lit {
                    ctx.literal_lengths.insert(name, bytes.value().len());
                }
            }
            _ => {}
        }
    }
}

impl Default for DefectVisitor {
    fn default() -> Self {
        DefectVisitor::new()
    }
}

impl<'ast> Visit<'ast> for DefectVisitor {
    fn visit_item_fn(&mut self, i: &'ast ItemFn) {
        let parent = self.enter_function(
            i.sig.ident.to_string(),
            i.to_token_stream().to_string(),
        );
        visit::visit_item_fn(self, i);
        self.leave_function(parent);
    }

    fn visit_impl_item_fn(&mut self, i: &'ast ImplItemFn) {
        let parent = self.enter_function(
            i.sig.ident.to_string(),
            i.to_token_stream().to_string(),
        );
        visit::visit_impl_item_fn(self, i);
        self.leave_function(parent);
    }

    fn visit_local(&mut self, i: &'ast Local) {
        self.record_local(i);
        visit::visit_local(self, i);
    }

    fn visit_expr_call(&mut self, i: &'ast ExprCall) {
        if let Expr::Path(path) = &*i.func {
            let callee = path.to_token_stream().to_string().replace(' ', "");
            let line = i.span().start().line;
            self.handle_call(&callee, &i.args, line);
        }
        visit::visit_expr_call(self, i);
    }
}

// Suffix match so `std::ptr::copy` and `ptr::copy` both resolve
fn matches_signature(callee: &str, signatures: &[&str]) -> bool {
    signatures
        .iter()
        .any(|sig| callee == *sig || callee.ends_with(&format!("::{sig}")))
}

// `buffer.as_mut_ptr()` / `buffer.as_ptr()` -> "buffer"
fn pointer_receiver(expr: &Expr) -> Option<String> {
    if let Expr::MethodCall(call) = expr {
        if (call.method == "as_mut_ptr" || call.method == "as_ptr") && call.args.is_empty() {
            return path_ident(&call.receiver);
        }
    }
    None
}

fn path_ident(expr: &Expr) -> Option<String> {
    if let Expr::Path(path) = expr {
        return path.path.get_ident().map(|ident| ident.to_string());
    }
    None
}

fn int_literal(expr: &Expr) -> Option<usize> {
    if let Expr::Lit(lit) = expr {
        if let Lit::Int(int) = &lit.lit {
            return int.base10_parse::<usize>().ok();
        }
    }
    None
}
