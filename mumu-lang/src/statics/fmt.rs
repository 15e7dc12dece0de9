use crate::syntax::TypeHandle;
use crate::utils::fmt::{Args, FmtArgs};

impl FmtArgs for TypeHandle {
    fn fmt_args(&self, fargs: Args) -> String {
        match fargs.ctx {
            Some(ctx) => ctx.render_type(*self),
            None => format!("<UNKNOWN TYPE: {}>", self.0),
        }
    }
}
