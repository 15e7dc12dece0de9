use crate::statics::ctx::TypingContext;

/// Options threaded through every `fmt_args` call.
#[derive(Clone, Copy)]
pub struct Args<'ctx> {
    /// Use the ASCII `mu`/`mu'` spellings instead of `μ`/`μ'`.
    pub ascii: bool,
    /// Append `: <type>` to every node that carries a type.
    pub with_types: bool,
    /// Typing context for rendering type handles.
    pub ctx: Option<&'ctx TypingContext>,
}

impl<'ctx> Args<'ctx> {
    pub fn new() -> Self {
        Args { ascii: true, with_types: false, ctx: None }
    }

    pub fn unicode(self) -> Self {
        Args { ascii: false, ..self }
    }

    pub fn typed(self, ctx: &'ctx TypingContext) -> Self {
        Args { with_types: true, ctx: Some(ctx), ..self }
    }
}

impl<'ctx> Default for Args<'ctx> {
    fn default() -> Self {
        Self::new()
    }
}

pub trait FmtArgs {
    fn fmt_args(&self, fargs: Args) -> String;

    fn fmt(&self) -> String {
        self.fmt_args(Args::new())
    }
}

impl<T: FmtArgs> FmtArgs for Box<T> {
    fn fmt_args(&self, fargs: Args) -> String {
        self.as_ref().fmt_args(fargs)
    }
}

impl FmtArgs for String {
    fn fmt_args(&self, _fargs: Args) -> String {
        self.clone()
    }
}

/// Renders `(e1 e2 ...)`.
pub fn fmt_list<'a, T: FmtArgs + 'a>(
    items: impl IntoIterator<Item = &'a T>, fargs: Args,
) -> String {
    let items: Vec<_> = items.into_iter().map(|item| item.fmt_args(fargs)).collect();
    format!("({})", items.join(" "))
}
