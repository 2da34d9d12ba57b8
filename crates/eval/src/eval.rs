use tinymush_common::limits::qreg_chartab;

use crate::context::EvalContext;
use crate::functions::{dispatch, lookup};
use crate::parse::{find_matching, split_args};

/// Walks `input` once, expanding `%`-substitutions, `[...]` sub-evaluation
/// and `name(args)` function calls; any other byte (including raw ANSI
/// escapes) passes through unchanged (spec.md §4.E).
pub fn eval(ctx: &mut EvalContext, input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::new();
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '%' => {
                i = eval_percent(ctx, &chars, i, &mut out);
            }
            '[' => match find_matching(&chars, i) {
                Some(end) => {
                    let inner: String = chars[i + 1..end].iter().collect();
                    match ctx.enter_nesting() {
                        Ok(()) => {
                            out.push_str(&eval(ctx, &inner));
                            ctx.leave_nesting();
                        }
                        Err(msg) => out.push_str(&msg),
                    }
                    i = end + 1;
                }
                None => {
                    out.push(c);
                    i += 1;
                }
            },
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                let mut j = i;
                while j < chars.len() && (chars[j].is_ascii_alphanumeric() || chars[j] == '_') {
                    j += 1;
                }
                if j < chars.len() && chars[j] == '(' {
                    let name: String = chars[start..j].iter().collect();
                    match find_matching(&chars, j) {
                        Some(close) if lookup(&name).is_some() => {
                            let args_text: String = chars[j + 1..close].iter().collect();
                            let raw_args = split_args(&args_text);
                            match ctx.enter_nesting() {
                                Ok(()) => {
                                    out.push_str(&dispatch(ctx, &name, &raw_args));
                                    ctx.leave_nesting();
                                }
                                Err(msg) => out.push_str(&msg),
                            }
                            i = close + 1;
                        }
                        _ => {
                            // Unknown identifier or unbalanced paren: emit verbatim.
                            out.extend(&chars[start..j]);
                            i = j;
                        }
                    }
                } else {
                    out.push(c);
                    i += 1;
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// `%0..%9` positional args, `%q<ch>` q-register reads, and the single
/// built-in letter substitutions (spec.md §4.E token 1).
fn eval_percent(ctx: &mut EvalContext, chars: &[char], i: usize, out: &mut String) -> usize {
    let Some(&next) = chars.get(i + 1) else {
        out.push('%');
        return i + 1;
    };
    match next {
        '0'..='9' => {
            let idx = (next as u8 - b'0') as usize;
            if let Some(arg) = ctx.args.get(idx) {
                out.push_str(arg);
            }
            i + 2
        }
        'q' => {
            if let Some(&regch) = chars.get(i + 2) {
                if qreg_chartab(regch).is_some() {
                    out.push_str(ctx.regs.get(&regch.to_string()));
                    return i + 3;
                }
            }
            out.push('%');
            out.push('q');
            i + 2
        }
        '%' => {
            out.push('%');
            i + 2
        }
        'n' => {
            if let Ok(obj) = ctx.db.get(ctx.executor) {
                out.push_str(&obj.name);
            }
            i + 2
        }
        'l' => {
            if let Ok(obj) = ctx.db.get(ctx.executor) {
                out.push_str(&format!("#{}", obj.location.0));
            }
            i + 2
        }
        'c' => {
            out.push_str(&format!("#{}", ctx.caller.0));
            i + 2
        }
        '#' => {
            out.push_str(&format!("#{}", ctx.enactor.0));
            i + 2
        }
        '!' => {
            out.push_str(&format!("#{}", ctx.executor.0));
            i + 2
        }
        'r' => {
            out.push_str("\r\n");
            i + 2
        }
        't' => {
            out.push('\t');
            i + 2
        }
        _ => {
            out.push('%');
            out.push(next);
            i + 2
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AttrTextLookup;
    use tinymush_acl::AttrResolver;
    use tinymush_common::{Dbref, ObjectKind};
    use tinymush_db::ObjectDb;
    use tinymush_vars::{RegFrame, StackStore, StructStore, XVarStore};

    fn no_attrs(_: &str) -> Option<u32> {
        None
    }
    fn no_text(_: Dbref, _: &str) -> Option<String> {
        None
    }

    fn fresh_ctx<'a>(
        db: &'a mut ObjectDb,
        regs: &'a mut RegFrame,
        xvars: &'a mut XVarStore,
        stacks: &'a mut StackStore,
        structs: &'a mut StructStore,
        resolver: &'a dyn AttrResolver,
        text: &'a dyn AttrTextLookup,
        who: Dbref,
    ) -> EvalContext<'a> {
        EvalContext {
            db,
            regs,
            xvars,
            stacks,
            structs,
            attrs: resolver,
            attr_text: text,
            caller: who,
            enactor: who,
            executor: who,
            args: Vec::new(),
            limitmask: tinymush_acl::FunctionLimitMask::empty(),
            invocations: 0,
            invocation_limit: 10_000,
            nesting: 0,
            max_nesting: 50,
        }
    }

    #[test]
    fn scenario_setq_and_r() {
        let mut db = ObjectDb::new();
        let who = db.create(ObjectKind::Player, Dbref::NOTHING);
        let mut regs = RegFrame::new();
        let mut xvars = XVarStore::new();
        let mut stacks = StackStore::new();
        let mut structs = StructStore::new();
        let resolver = no_attrs as fn(&str) -> Option<u32>;
        let text = no_text as fn(Dbref, &str) -> Option<String>;
        let mut ctx = fresh_ctx(&mut db, &mut regs, &mut xvars, &mut stacks, &mut structs, &resolver, &text, who);

        assert_eq!(eval(&mut ctx, "setq(x,hello)[r(x)]"), "hello");
    }

    #[test]
    fn scenario_setq_pair_and_add() {
        let mut db = ObjectDb::new();
        let who = db.create(ObjectKind::Player, Dbref::NOTHING);
        let mut regs = RegFrame::new();
        let mut xvars = XVarStore::new();
        let mut stacks = StackStore::new();
        let mut structs = StructStore::new();
        let resolver = no_attrs as fn(&str) -> Option<u32>;
        let text = no_text as fn(Dbref, &str) -> Option<String>;
        let mut ctx = fresh_ctx(&mut db, &mut regs, &mut xvars, &mut stacks, &mut structs, &resolver, &text, who);

        assert_eq!(eval(&mut ctx, "setq(a,1,b,2)[add(%qa,%qb)]"), "3");
    }

    #[test]
    fn scenario_justify_and_after_before() {
        let mut db = ObjectDb::new();
        let who = db.create(ObjectKind::Player, Dbref::NOTHING);
        let mut regs = RegFrame::new();
        let mut xvars = XVarStore::new();
        let mut stacks = StackStore::new();
        let mut structs = StructStore::new();
        let resolver = no_attrs as fn(&str) -> Option<u32>;
        let text = no_text as fn(Dbref, &str) -> Option<String>;
        let mut ctx = fresh_ctx(&mut db, &mut regs, &mut xvars, &mut stacks, &mut structs, &resolver, &text, who);

        assert_eq!(eval(&mut ctx, "ljust(hi,5,.)"), "hi...");
        assert_eq!(eval(&mut ctx, "rjust(hi,5,.)"), "...hi");
        assert_eq!(eval(&mut ctx, "center(hi,6,-)"), "--hi--");
        assert_eq!(eval(&mut ctx, "after(foo=bar=baz,=)"), "bar=baz");
        assert_eq!(eval(&mut ctx, "before(foo=bar=baz,=)"), "foo");
    }

    #[test]
    fn scenario_wildmatch_sets_registers() {
        let mut db = ObjectDb::new();
        let who = db.create(ObjectKind::Player, Dbref::NOTHING);
        let mut regs = RegFrame::new();
        let mut xvars = XVarStore::new();
        let mut stacks = StackStore::new();
        let mut structs = StructStore::new();
        let resolver = no_attrs as fn(&str) -> Option<u32>;
        let text = no_text as fn(Dbref, &str) -> Option<String>;
        let mut ctx = fresh_ctx(&mut db, &mut regs, &mut xvars, &mut stacks, &mut structs, &resolver, &text, who);

        assert_eq!(eval(&mut ctx, "wildmatch(foo bar baz,* bar *,0 1)"), "1");
        assert_eq!(ctx.regs.get("0"), "foo");
        assert_eq!(ctx.regs.get("1"), "baz");
    }

    #[test]
    fn scenario_regmatch_sets_registers() {
        let mut db = ObjectDb::new();
        let who = db.create(ObjectKind::Player, Dbref::NOTHING);
        let mut regs = RegFrame::new();
        let mut xvars = XVarStore::new();
        let mut stacks = StackStore::new();
        let mut structs = StructStore::new();
        let resolver = no_attrs as fn(&str) -> Option<u32>;
        let text = no_text as fn(Dbref, &str) -> Option<String>;
        let mut ctx = fresh_ctx(&mut db, &mut regs, &mut xvars, &mut stacks, &mut structs, &resolver, &text, who);

        assert_eq!(
            eval(&mut ctx, r"regmatch(abc123,^([a-z]+)([0-9]+)$,1 2)"),
            "1"
        );
        assert_eq!(ctx.regs.get("1"), "abc");
        assert_eq!(ctx.regs.get("2"), "123");
    }

    #[test]
    fn scenario_structure_construct_and_z() {
        let mut db = ObjectDb::new();
        let who = db.create(ObjectKind::Player, Dbref::NOTHING);
        let mut regs = RegFrame::new();
        let mut xvars = XVarStore::new();
        let mut stacks = StackStore::new();
        let mut structs = StructStore::new();
        let resolver = no_attrs as fn(&str) -> Option<u32>;
        let text = no_text as fn(Dbref, &str) -> Option<String>;
        let mut ctx = fresh_ctx(&mut db, &mut regs, &mut xvars, &mut stacks, &mut structs, &resolver, &text, who);

        let result = eval(
            &mut ctx,
            "structure(pt,x y,i i,0 0, )[construct(p1,pt,x y,3 4, )][z(p1,x)][z(p1,y)]",
        );
        assert_eq!(result, "1134");
    }

    #[test]
    fn unknown_function_name_is_emitted_verbatim() {
        let mut db = ObjectDb::new();
        let who = db.create(ObjectKind::Player, Dbref::NOTHING);
        let mut regs = RegFrame::new();
        let mut xvars = XVarStore::new();
        let mut stacks = StackStore::new();
        let mut structs = StructStore::new();
        let resolver = no_attrs as fn(&str) -> Option<u32>;
        let text = no_text as fn(Dbref, &str) -> Option<String>;
        let mut ctx = fresh_ctx(&mut db, &mut regs, &mut xvars, &mut stacks, &mut structs, &resolver, &text, who);

        assert_eq!(eval(&mut ctx, "bogus(a,b)"), "bogus(a,b)");
    }
}
