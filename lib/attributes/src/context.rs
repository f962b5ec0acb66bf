use opentelemetry::Context;

use crate::scope::AttributeScope;

/// Context entry holding the active node. Private so the only way in is through this module.
#[derive(Clone, Debug)]
struct BoundScope(AttributeScope);

/// Opens a scope named `name` below whatever `cx` carries.
///
/// Without a bound node a new root is created, otherwise a child of the bound node. The
/// returned context binds the new node and shadows the previous binding; `cx` is left
/// untouched.
pub fn enter_scope(cx: &Context, name: impl Into<String>) -> (Context, AttributeScope) {
    let scope = match cx.get::<BoundScope>() {
        Some(BoundScope(parent)) => parent.create_child(name),
        None => AttributeScope::new_root(name),
    };

    (cx.with_value(BoundScope(scope.clone())), scope)
}

/// Node bound in `cx`, or `None` if the context never went through [`enter_scope`].
pub fn current_scope(cx: &Context) -> Option<AttributeScope> {
    cx.get::<BoundScope>().map(|BoundScope(scope)| scope.clone())
}

/// Enters `name` on top of [`Context::current`] and keeps the derived context attached while
/// `f` runs. The previous context is restored when `f` returns or unwinds.
pub fn in_scope<F, R>(name: impl Into<String>, f: F) -> R
where
    F: FnOnce(&AttributeScope) -> R,
{
    let (cx, scope) = enter_scope(&Context::current(), name);
    let _guard = cx.attach();
    f(&scope)
}

pub trait ScopeContextExt {
    fn attribute_scope(&self) -> Option<AttributeScope>;

    fn enter_attribute_scope(&self, name: impl Into<String>) -> (Context, AttributeScope);

    /// Binds an already existing node, e.g. one received from another task.
    fn with_attribute_scope(&self, scope: AttributeScope) -> Context;
}

impl ScopeContextExt for Context {
    #[inline]
    fn attribute_scope(&self) -> Option<AttributeScope> {
        current_scope(self)
    }

    #[inline]
    fn enter_attribute_scope(&self, name: impl Into<String>) -> (Context, AttributeScope) {
        enter_scope(self, name)
    }

    fn with_attribute_scope(&self, scope: AttributeScope) -> Context {
        self.with_value(BoundScope(scope))
    }
}
