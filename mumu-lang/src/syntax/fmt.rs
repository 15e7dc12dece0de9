use super::*;
use crate::utils::fmt::{fmt_list, Args, FmtArgs};

fn type_suffix(ty: &Option<TypeHandle>, fargs: Args) -> String {
    match ty {
        Some(ty) if fargs.with_types => format!(": {}", ty.fmt_args(fargs)),
        _ => String::new(),
    }
}

impl FmtArgs for Producer {
    fn fmt_args(&self, fargs: Args) -> String {
        match self {
            Producer::Variable(prod) => prod.fmt_args(fargs),
            Producer::Int(prod) => prod.fmt_args(fargs),
            Producer::Mu(prod) => prod.fmt_args(fargs),
            Producer::Constructor(prod) => prod.fmt_args(fargs),
            Producer::Cocase(prod) => prod.fmt_args(fargs),
        }
    }
}

impl FmtArgs for Variable {
    fn fmt_args(&self, fargs: Args) -> String {
        format!("{}{}", self.name, type_suffix(&self.ty, fargs))
    }
}

impl FmtArgs for IntLiteral {
    fn fmt_args(&self, fargs: Args) -> String {
        format!("{}{}", self.value, type_suffix(&self.ty, fargs))
    }
}

impl FmtArgs for Mu {
    fn fmt_args(&self, fargs: Args) -> String {
        let keyword = if fargs.ascii { kw::MU } else { kw::MU_UNICODE };
        format!(
            "({} {} {}){}",
            keyword,
            self.coarg_name,
            self.body.fmt_args(fargs),
            type_suffix(&self.ty, fargs)
        )
    }
}

impl FmtArgs for Constructor {
    fn fmt_args(&self, fargs: Args) -> String {
        let mut out = format!("({}", self.name);
        if !self.args.is_empty() {
            out.push(' ');
            out.push_str(&fmt_list(&self.args, fargs));
        }
        if !self.coargs.is_empty() {
            out.push(' ');
            out.push_str(&fmt_list(&self.coargs, fargs));
        }
        out.push(')');
        out.push_str(&type_suffix(&self.ty, fargs));
        out
    }
}

impl FmtArgs for Cocase {
    fn fmt_args(&self, fargs: Args) -> String {
        format!(
            "({} {}){}",
            kw::COCASE,
            fmt_list(&self.clauses, fargs),
            type_suffix(&self.ty, fargs)
        )
    }
}

impl FmtArgs for Consumer {
    fn fmt_args(&self, fargs: Args) -> String {
        match self {
            Consumer::Covariable(cons) => cons.fmt_args(fargs),
            Consumer::MuTilde(cons) => cons.fmt_args(fargs),
            Consumer::Destructor(cons) => cons.fmt_args(fargs),
            Consumer::Case(cons) => cons.fmt_args(fargs),
            Consumer::End(cons) => cons.fmt_args(fargs),
        }
    }
}

impl FmtArgs for Covariable {
    fn fmt_args(&self, fargs: Args) -> String {
        format!("{}{}", self.name, type_suffix(&self.ty, fargs))
    }
}

impl FmtArgs for MuTilde {
    fn fmt_args(&self, fargs: Args) -> String {
        let keyword = if fargs.ascii { kw::MU_TILDE } else { kw::MU_TILDE_UNICODE };
        format!(
            "({} {} {}){}",
            keyword,
            self.arg_name,
            self.body.fmt_args(fargs),
            type_suffix(&self.ty, fargs)
        )
    }
}

impl FmtArgs for Destructor {
    fn fmt_args(&self, fargs: Args) -> String {
        let mut out = format!("({}", self.name);
        if !self.args.is_empty() {
            out.push(' ');
            out.push_str(&fmt_list(&self.args, fargs));
        }
        if !self.coargs.is_empty() {
            out.push(' ');
            out.push_str(&fmt_list(&self.coargs, fargs));
        }
        out.push(')');
        out.push_str(&type_suffix(&self.ty, fargs));
        out
    }
}

impl FmtArgs for Case {
    fn fmt_args(&self, fargs: Args) -> String {
        format!(
            "({} {}){}",
            kw::CASE,
            fmt_list(&self.clauses, fargs),
            type_suffix(&self.ty, fargs)
        )
    }
}

impl FmtArgs for End {
    fn fmt_args(&self, fargs: Args) -> String {
        format!("{}{}", kw::END, type_suffix(&self.ty, fargs))
    }
}

impl FmtArgs for Statement {
    fn fmt_args(&self, fargs: Args) -> String {
        match self {
            Statement::Arithmetic(stmt) => stmt.fmt_args(fargs),
            Statement::Ifz(stmt) => stmt.fmt_args(fargs),
            Statement::Cut(stmt) => stmt.fmt_args(fargs),
            Statement::Call(stmt) => stmt.fmt_args(fargs),
        }
    }
}

impl FmtArgs for Arithmetic {
    fn fmt_args(&self, fargs: Args) -> String {
        format!(
            "({} {} {} {})",
            self.op.symbol(),
            self.left.fmt_args(fargs),
            self.right.fmt_args(fargs),
            self.after.fmt_args(fargs)
        )
    }
}

impl FmtArgs for Ifz {
    fn fmt_args(&self, fargs: Args) -> String {
        format!(
            "({} {} {} {})",
            kw::IFZ,
            self.condition.fmt_args(fargs),
            self.if_zero.fmt_args(fargs),
            self.if_other.fmt_args(fargs)
        )
    }
}

impl FmtArgs for Cut {
    fn fmt_args(&self, fargs: Args) -> String {
        format!("[{} {}]", self.producer.fmt_args(fargs), self.consumer.fmt_args(fargs))
    }
}

impl FmtArgs for Call {
    fn fmt_args(&self, fargs: Args) -> String {
        format!(
            "({} {} {})",
            self.name,
            fmt_list(&self.args, fargs),
            fmt_list(&self.coargs, fargs)
        )
    }
}

impl FmtArgs for Clause {
    fn fmt_args(&self, fargs: Args) -> String {
        let mut out = format!("({}", self.structor_name);
        if !self.arg_names.is_empty() {
            out.push(' ');
            out.push_str(&fmt_list(&self.arg_names, fargs));
        }
        if !self.coarg_names.is_empty() {
            out.push(' ');
            out.push_str(&fmt_list(&self.coarg_names, fargs));
        }
        out.push(' ');
        out.push_str(&self.body.fmt_args(fargs));
        out.push(')');
        out
    }
}

impl FmtArgs for Definition {
    fn fmt_args(&self, fargs: Args) -> String {
        format!(
            "({} {} {} {} {})",
            kw::DEF,
            self.name,
            fmt_list(&self.arg_names, fargs),
            fmt_list(&self.coarg_names, fargs),
            self.body.fmt_args(fargs)
        )
    }
}

impl FmtArgs for Program {
    fn fmt_args(&self, fargs: Args) -> String {
        let mut out = String::new();
        for definition in &self.definitions {
            out.push_str(&definition.fmt_args(fargs));
            out.push('\n');
        }
        for statement in &self.statements {
            out.push_str(&statement.fmt_args(fargs));
            out.push('\n');
        }
        out
    }
}
