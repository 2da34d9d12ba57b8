use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use tinymush_acl::{check_allowed, FunctionLimitMask};
use tinymush_buffer::{regexmatch, strfuncs, wildcard, Delim};
use tinymush_common::Dbref;

use crate::context::EvalContext;
use crate::eval::eval;

type Handler = fn(&mut EvalContext, &[String]) -> String;

pub struct FuncSpec {
    pub min_args: usize,
    pub max_args: usize,
    /// Whether arguments are evaluated before the handler runs. Functions
    /// that need to see raw, unevaluated source (`ucall`, `nofx`,
    /// `sandbox`) are lazy and evaluate their own sub-parts explicitly.
    pub eager: bool,
    pub side_effects: FunctionLimitMask,
    pub handler: Handler,
}

static TABLE: Lazy<FxHashMap<&'static str, FuncSpec>> = Lazy::new(|| {
    let mut m: FxHashMap<&'static str, FuncSpec> = FxHashMap::default();
    m.insert(
        "setq",
        FuncSpec { min_args: 2, max_args: usize::MAX, eager: true, side_effects: FunctionLimitMask::FN_QFX, handler: fn_setq },
    );
    m.insert(
        "r",
        FuncSpec { min_args: 1, max_args: 1, eager: true, side_effects: FunctionLimitMask::FN_QFX, handler: fn_r },
    );
    m.insert(
        "add",
        FuncSpec { min_args: 1, max_args: usize::MAX, eager: true, side_effects: FunctionLimitMask::empty(), handler: fn_add },
    );
    m.insert(
        "wildmatch",
        FuncSpec { min_args: 3, max_args: 3, eager: true, side_effects: FunctionLimitMask::FN_QFX, handler: fn_wildmatch },
    );
    m.insert(
        "regmatch",
        FuncSpec { min_args: 3, max_args: 3, eager: true, side_effects: FunctionLimitMask::FN_QFX, handler: fn_regmatch },
    );
    m.insert(
        "ljust",
        FuncSpec { min_args: 2, max_args: 3, eager: true, side_effects: FunctionLimitMask::empty(), handler: fn_ljust },
    );
    m.insert(
        "rjust",
        FuncSpec { min_args: 2, max_args: 3, eager: true, side_effects: FunctionLimitMask::empty(), handler: fn_rjust },
    );
    m.insert(
        "center",
        FuncSpec { min_args: 2, max_args: 3, eager: true, side_effects: FunctionLimitMask::empty(), handler: fn_center },
    );
    m.insert(
        "after",
        FuncSpec { min_args: 2, max_args: 2, eager: true, side_effects: FunctionLimitMask::empty(), handler: fn_after },
    );
    m.insert(
        "before",
        FuncSpec { min_args: 2, max_args: 2, eager: true, side_effects: FunctionLimitMask::empty(), handler: fn_before },
    );
    m.insert(
        "structure",
        FuncSpec { min_args: 5, max_args: 5, eager: true, side_effects: FunctionLimitMask::FN_DBFX, handler: fn_structure },
    );
    m.insert(
        "construct",
        FuncSpec { min_args: 5, max_args: 5, eager: true, side_effects: FunctionLimitMask::FN_DBFX, handler: fn_construct },
    );
    m.insert(
        "z",
        FuncSpec { min_args: 2, max_args: 2, eager: true, side_effects: FunctionLimitMask::FN_DBFX, handler: fn_z },
    );
    m.insert(
        "modify",
        FuncSpec { min_args: 3, max_args: 3, eager: true, side_effects: FunctionLimitMask::FN_DBFX, handler: fn_modify },
    );
    m.insert(
        "unload",
        FuncSpec { min_args: 2, max_args: 2, eager: true, side_effects: FunctionLimitMask::FN_DBFX, handler: fn_unload },
    );
    m.insert(
        "read",
        FuncSpec { min_args: 3, max_args: 3, eager: true, side_effects: FunctionLimitMask::FN_DBFX, handler: fn_read },
    );
    m.insert(
        "destruct",
        FuncSpec { min_args: 1, max_args: 1, eager: true, side_effects: FunctionLimitMask::FN_DBFX, handler: fn_destruct },
    );
    m.insert(
        "unstructure",
        FuncSpec { min_args: 1, max_args: 1, eager: true, side_effects: FunctionLimitMask::FN_DBFX, handler: fn_unstructure },
    );
    m.insert(
        "push",
        FuncSpec { min_args: 2, max_args: 2, eager: true, side_effects: FunctionLimitMask::FN_STACKFX, handler: fn_push },
    );
    m.insert(
        "pop",
        FuncSpec { min_args: 1, max_args: 2, eager: true, side_effects: FunctionLimitMask::FN_STACKFX, handler: fn_pop },
    );
    m.insert(
        "peek",
        FuncSpec { min_args: 1, max_args: 2, eager: true, side_effects: FunctionLimitMask::FN_STACKFX, handler: fn_peek },
    );
    m.insert(
        "toss",
        FuncSpec { min_args: 1, max_args: 2, eager: true, side_effects: FunctionLimitMask::FN_STACKFX, handler: fn_toss },
    );
    m.insert(
        "dup",
        FuncSpec { min_args: 1, max_args: 2, eager: true, side_effects: FunctionLimitMask::FN_STACKFX, handler: fn_dup },
    );
    m.insert(
        "swap",
        FuncSpec { min_args: 1, max_args: 1, eager: true, side_effects: FunctionLimitMask::FN_STACKFX, handler: fn_swap },
    );
    m.insert(
        "popn",
        FuncSpec { min_args: 4, max_args: 4, eager: true, side_effects: FunctionLimitMask::FN_STACKFX, handler: fn_popn },
    );
    m.insert(
        "left",
        FuncSpec { min_args: 2, max_args: 2, eager: true, side_effects: FunctionLimitMask::empty(), handler: fn_left },
    );
    m.insert(
        "mid",
        FuncSpec { min_args: 3, max_args: 3, eager: true, side_effects: FunctionLimitMask::empty(), handler: fn_mid },
    );
    m.insert(
        "x",
        FuncSpec { min_args: 1, max_args: 1, eager: true, side_effects: FunctionLimitMask::FN_VARFX, handler: fn_xget },
    );
    m.insert(
        "setvar",
        FuncSpec { min_args: 2, max_args: 2, eager: true, side_effects: FunctionLimitMask::FN_VARFX, handler: fn_xset },
    );
    m.insert(
        "ucall",
        FuncSpec { min_args: 2, max_args: usize::MAX, eager: false, side_effects: FunctionLimitMask::FN_OUTFX, handler: fn_ucall },
    );
    m.insert(
        "nofx",
        FuncSpec { min_args: 2, max_args: 2, eager: false, side_effects: FunctionLimitMask::empty(), handler: fn_nofx },
    );
    m.insert(
        "sandbox",
        FuncSpec { min_args: 1, max_args: 1, eager: false, side_effects: FunctionLimitMask::empty(), handler: fn_sandbox },
    );
    m
});

pub fn lookup(name: &str) -> Option<&'static FuncSpec> {
    TABLE.get(name.to_ascii_lowercase().as_str())
}

/// Checks the function table, arity, invocation budget and the side-effect
/// limit mask, evaluates eager arguments, then runs the handler (spec.md
/// §4.E "Function invocation contract").
pub fn dispatch(ctx: &mut EvalContext, name: &str, raw_args: &[String]) -> String {
    let Some(spec) = lookup(name) else {
        return format!("{name}({})", raw_args.join(","));
    };
    if raw_args.len() < spec.min_args || raw_args.len() > spec.max_args {
        return format!("#-1 FUNCTION ({}) EXPECTS {}-{} ARGUMENTS", name.to_ascii_uppercase(), spec.min_args, spec.max_args);
    }
    if let Err(e) = check_allowed(ctx.limitmask, spec.side_effects) {
        return format!("#-1 {}", e.to_string().to_ascii_uppercase());
    }
    if let Err(msg) = ctx.charge_invocation() {
        return msg;
    }
    if spec.eager {
        let evaluated: Vec<String> = raw_args.iter().map(|a| eval(ctx, a)).collect();
        (spec.handler)(ctx, &evaluated)
    } else {
        (spec.handler)(ctx, raw_args)
    }
}

fn fn_setq(ctx: &mut EvalContext, args: &[String]) -> String {
    if args.len() == 2 {
        let old = ctx.regs.get(&args[0]).to_string();
        ctx.regs.set(&args[0], &args[1]);
        return old;
    }
    if args.len() % 2 != 0 {
        return "#-1 FUNCTION (SETQ) EXPECTS AN EVEN NUMBER OF ARGUMENTS".to_string();
    }
    let mut errors = 0;
    for pair in args.chunks(2) {
        if ctx.regs.set(&pair[0], &pair[1]) < 0 {
            errors += 1;
        }
    }
    errors.to_string()
}

fn fn_r(ctx: &mut EvalContext, args: &[String]) -> String {
    ctx.regs.get(&args[0]).to_string()
}

fn fn_add(_ctx: &mut EvalContext, args: &[String]) -> String {
    let mut total: i64 = 0;
    for a in args {
        match a.trim().parse::<i64>() {
            Ok(n) => total += n,
            Err(_) => return "#-1 ARGUMENTS MUST BE NUMBERS".to_string(),
        }
    }
    total.to_string()
}

fn fn_wildmatch(ctx: &mut EvalContext, args: &[String]) -> String {
    let (text, pattern, regnames) = (&args[0], &args[1], &args[2]);
    match wildcard::wildmatch(text, pattern) {
        Some(caps) => {
            for (name, value) in regnames.split_whitespace().zip(caps.iter()) {
                ctx.regs.set(name, value);
            }
            "1".to_string()
        }
        None => "0".to_string(),
    }
}

fn fn_regmatch(ctx: &mut EvalContext, args: &[String]) -> String {
    let (text, pattern, regnames) = (&args[0], &args[1], &args[2]);
    match regexmatch::regmatch(text, pattern) {
        Ok(Some(groups)) => {
            for (name, value) in regnames.split_whitespace().zip(groups.iter()) {
                ctx.regs.set(name, value);
            }
            "1".to_string()
        }
        Ok(None) => "0".to_string(),
        Err(_) => "#-1 REGEXP ERROR".to_string(),
    }
}

fn fill_char(args: &[String], idx: usize) -> char {
    args.get(idx).and_then(|s| s.chars().next()).unwrap_or(' ')
}

fn fn_ljust(_ctx: &mut EvalContext, args: &[String]) -> String {
    let width: usize = args[1].trim().parse().unwrap_or(0);
    strfuncs::ljust(&args[0], width, fill_char(args, 2))
}

fn fn_rjust(_ctx: &mut EvalContext, args: &[String]) -> String {
    let width: usize = args[1].trim().parse().unwrap_or(0);
    strfuncs::rjust(&args[0], width, fill_char(args, 2))
}

fn fn_center(_ctx: &mut EvalContext, args: &[String]) -> String {
    let width: usize = args[1].trim().parse().unwrap_or(0);
    strfuncs::center(&args[0], width, fill_char(args, 2))
}

fn fn_after(_ctx: &mut EvalContext, args: &[String]) -> String {
    strfuncs::after(&args[0], &args[1]).to_string()
}

fn fn_before(_ctx: &mut EvalContext, args: &[String]) -> String {
    strfuncs::before(&args[0], &args[1]).to_string()
}

fn fn_left(_ctx: &mut EvalContext, args: &[String]) -> String {
    let k: i64 = args[1].trim().parse().unwrap_or(0);
    strfuncs::left(&args[0], k)
}

fn fn_mid(_ctx: &mut EvalContext, args: &[String]) -> String {
    let start: i64 = args[1].trim().parse().unwrap_or(0);
    let len: i64 = args[2].trim().parse().unwrap_or(0);
    strfuncs::mid(&args[0], start, len)
}

fn space_list(s: &str) -> Vec<&str> {
    if s.trim().is_empty() {
        Vec::new()
    } else {
        s.split_whitespace().collect()
    }
}

fn fn_structure(ctx: &mut EvalContext, args: &[String]) -> String {
    let (name, comps, types, defaults) = (&args[0], &args[1], &args[2], &args[3]);
    let comps = space_list(comps);
    let types = space_list(types);
    let defaults = space_list(defaults);
    match ctx.structs.structure(ctx.executor, name, &comps, &types, &defaults) {
        Ok(()) => "1".to_string(),
        Err(e) => format!("#-1 {}", e.to_string().to_ascii_uppercase()),
    }
}

fn fn_construct(ctx: &mut EvalContext, args: &[String]) -> String {
    let (inst, struct_name, names, vals) = (&args[0], &args[1], &args[2], &args[3]);
    let names_list = space_list(names);
    let vals_list = space_list(vals);
    let (names_opt, vals_opt) = if names_list.is_empty() {
        (None, None)
    } else {
        (Some(names_list.as_slice()), Some(vals_list.as_slice()))
    };
    match ctx.structs.construct(ctx.executor, inst, ctx.executor, struct_name, names_opt, vals_opt) {
        Ok(()) => "1".to_string(),
        Err(e) => format!("#-1 {}", e.to_string().to_ascii_uppercase()),
    }
}

fn fn_z(ctx: &mut EvalContext, args: &[String]) -> String {
    ctx.structs.z(ctx.executor, &args[0], &args[1]).unwrap_or("").to_string()
}

fn fn_modify(ctx: &mut EvalContext, args: &[String]) -> String {
    let names_list = space_list(&args[1]);
    let vals_list = space_list(&args[2]);
    match ctx.structs.modify(ctx.executor, &args[0], &names_list, &vals_list) {
        Ok(()) => "1".to_string(),
        Err(e) => format!("#-1 {}", e.to_string().to_ascii_uppercase()),
    }
}

fn fn_unload(ctx: &mut EvalContext, args: &[String]) -> String {
    let delim = Delim::from_str_arg(&args[1]);
    ctx.structs.unload(ctx.executor, &args[0], &delim).unwrap_or_default()
}

/// `read(<obj>/<attr>, inst, struct)`: loads an instance's values from the
/// named attribute's text (spec.md §4.D), round-tripping with `unload`.
fn fn_read(ctx: &mut EvalContext, args: &[String]) -> String {
    let (inst, struct_name) = (&args[1], &args[2]);
    let Some((obj_str, attr_name)) = args[0].split_once('/') else {
        return "#-1 NO MATCH".to_string();
    };
    let Some(obj) = parse_dbref(obj_str) else {
        return "#-1 NO MATCH".to_string();
    };
    let Some(text) = ctx.attr_text.lookup(obj, attr_name) else {
        return String::new();
    };
    match ctx.structs.read_from_text(ctx.executor, inst, ctx.executor, struct_name, &text, &Delim::Space) {
        Ok(()) => "1".to_string(),
        Err(e) => format!("#-1 {}", e.to_string().to_ascii_uppercase()),
    }
}

fn fn_destruct(ctx: &mut EvalContext, args: &[String]) -> String {
    if ctx.structs.destruct(ctx.executor, &args[0]) { "1".to_string() } else { "0".to_string() }
}

fn fn_unstructure(ctx: &mut EvalContext, args: &[String]) -> String {
    match ctx.structs.unstructure(ctx.executor, &args[0]) {
        Ok(()) => "1".to_string(),
        Err(e) => format!("#-1 {}", e.to_string().to_ascii_uppercase()),
    }
}

fn fn_push(ctx: &mut EvalContext, args: &[String]) -> String {
    let ok = ctx.stacks.push(ctx.executor, &args[1]);
    if ok { "1".to_string() } else { "0".to_string() }
}

fn fn_pop(ctx: &mut EvalContext, args: &[String]) -> String {
    let pos: usize = args.get(1).and_then(|s| s.trim().parse().ok()).unwrap_or(0);
    ctx.stacks.pop(ctx.executor, pos)
}

fn fn_peek(ctx: &mut EvalContext, args: &[String]) -> String {
    let pos: usize = args.get(1).and_then(|s| s.trim().parse().ok()).unwrap_or(0);
    ctx.stacks.peek(ctx.executor, pos).to_string()
}

fn fn_toss(ctx: &mut EvalContext, args: &[String]) -> String {
    let pos: usize = args.get(1).and_then(|s| s.trim().parse().ok()).unwrap_or(0);
    ctx.stacks.toss(ctx.executor, pos);
    String::new()
}

fn fn_dup(ctx: &mut EvalContext, args: &[String]) -> String {
    let pos: usize = args.get(1).and_then(|s| s.trim().parse().ok()).unwrap_or(0);
    if ctx.stacks.dup(ctx.executor, pos) { "1".to_string() } else { "0".to_string() }
}

fn fn_swap(ctx: &mut EvalContext, _args: &[String]) -> String {
    if ctx.stacks.swap(ctx.executor) { "1".to_string() } else { "0".to_string() }
}

fn fn_popn(ctx: &mut EvalContext, args: &[String]) -> String {
    let pos: usize = args[1].trim().parse().unwrap_or(0);
    let n: usize = args[2].trim().parse().unwrap_or(0);
    let osep = Delim::from_str_arg(&args[3]);
    ctx.stacks.popn(ctx.executor, pos, n, &osep)
}

fn fn_xget(ctx: &mut EvalContext, args: &[String]) -> String {
    ctx.xvars.get(ctx.executor, &args[0]).to_string()
}

fn fn_xset(ctx: &mut EvalContext, args: &[String]) -> String {
    match ctx.xvars.set(ctx.executor, &args[0], &args[1]) {
        Ok(()) => String::new(),
        Err(e) => format!("#-1 {}", e.to_string().to_ascii_uppercase()),
    }
}

/// `ucall(<obj>/<attr> | #lambda/<code>, <passlist>, arg0, arg1, ...)`.
/// The callee always runs in the caller's live register frame (never a
/// copy) and the caller's original registers are restored unconditionally
/// on return; `<passlist>` only controls which registers the callee can
/// *see* going in (spec.md §8 boundary behaviors):
///   - empty: every inbound register is cleared first.
///   - `@_`: every register is passed through unchanged.
///   - `@_ a b c`: only `a`, `b`, `c` are cleared before the call.
fn fn_ucall(ctx: &mut EvalContext, raw_args: &[String]) -> String {
    let target = raw_args[0].trim();
    let passlist = eval(ctx, &raw_args[1]);
    let call_args: Vec<String> = raw_args[2..].iter().map(|a| eval(ctx, a)).collect();

    let (code, owner) = if let Some(lambda) = target.strip_prefix("#lambda/") {
        (lambda.to_string(), ctx.caller)
    } else {
        match target.split_once('/') {
            Some((obj_str, attr_name)) => {
                let Some(obj) = parse_dbref(obj_str) else {
                    return "#-1 NO MATCH".to_string();
                };
                match ctx.attr_text.lookup(obj, attr_name) {
                    Some(text) => (text, obj),
                    None => return String::new(),
                }
            }
            None => return "#-1 NO MATCH".to_string(),
        }
    };

    let original = ctx.regs.save();
    if passlist.is_empty() {
        ctx.regs.clear_all();
    } else if passlist == "@_" {
        // pass every register through unchanged
    } else if let Some(rest) = passlist.strip_prefix("@_ ") {
        for name in rest.split_whitespace() {
            ctx.regs.set(name, "");
        }
    } else {
        ctx.regs.clear_all();
    }

    let saved_args = std::mem::replace(&mut ctx.args, call_args);
    let saved_caller = ctx.caller;
    let saved_executor = ctx.executor;
    ctx.caller = ctx.executor;
    ctx.executor = owner;

    let result = eval(ctx, &code);

    ctx.regs.restore(&original);
    ctx.args = saved_args;
    ctx.caller = saved_caller;
    ctx.executor = saved_executor;
    result
}

fn parse_dbref(s: &str) -> Option<Dbref> {
    s.trim().strip_prefix('#')?.parse::<i32>().ok().map(Dbref)
}

/// `nofx(<classes>, <code>)`: forbids the named side-effect classes for
/// the duration of evaluating `<code>`.
fn fn_nofx(ctx: &mut EvalContext, raw_args: &[String]) -> String {
    let classes = raw_args[0].trim();
    let mut mask = FunctionLimitMask::empty();
    for c in classes.split_whitespace() {
        mask |= match c.to_ascii_uppercase().as_str() {
            "DBFX" => FunctionLimitMask::FN_DBFX,
            "QFX" => FunctionLimitMask::FN_QFX,
            "OUTFX" => FunctionLimitMask::FN_OUTFX,
            "VARFX" => FunctionLimitMask::FN_VARFX,
            "STACKFX" => FunctionLimitMask::FN_STACKFX,
            _ => FunctionLimitMask::empty(),
        };
    }
    let saved = ctx.limitmask;
    ctx.limitmask |= mask;
    let result = eval(ctx, &raw_args[1]);
    ctx.limitmask = saved;
    result
}

/// `sandbox(<code>)`: `nofx` with every side-effect class forbidden.
fn fn_sandbox(ctx: &mut EvalContext, raw_args: &[String]) -> String {
    let saved = ctx.limitmask;
    ctx.limitmask = FunctionLimitMask::all();
    let result = eval(ctx, &raw_args[0]);
    ctx.limitmask = saved;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_name_resolves_to_none() {
        assert!(lookup("frobnicate").is_none());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert!(lookup("SetQ").is_some());
    }
}
