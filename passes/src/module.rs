//! Host module tree the optimizer walks.
//!
//! A module owns named method graphs, named parameters and attributes, and
//! child modules. Traversal is worklist-based rather than recursive, so
//! deep module trees cannot overflow the stack.

use splice_ir::{AttrValue, Graph};

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub graph: Graph,
}

#[derive(Debug, Clone, Default)]
pub struct Module {
    pub name: String,
    methods: Vec<Method>,
    children: Vec<Module>,
    parameters: Vec<(String, AttrValue)>,
    attributes: Vec<(String, AttrValue)>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn add_method(&mut self, name: impl Into<String>, graph: Graph) {
        self.methods.push(Method { name: name.into(), graph });
    }

    pub fn get_methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn get_method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn add_child(&mut self, child: Module) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[Module] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Module] {
        &mut self.children
    }

    /// Replaces an existing parameter of the same name.
    pub fn register_parameter(&mut self, name: impl Into<String>, value: AttrValue) {
        let name = name.into();
        if let Some(slot) = self.parameters.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.parameters.push((name, value));
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&AttrValue> {
        self.parameters.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Replaces an existing attribute of the same name.
    pub fn register_attribute(&mut self, name: impl Into<String>, value: AttrValue) {
        let name = name.into();
        if let Some(slot) = self.attributes.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.attributes.push((name, value));
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Depth-first over the module tree, parents before children, siblings
    /// in declaration order.
    pub fn for_each_module_mut<E>(
        &mut self,
        f: &mut impl FnMut(&mut Module) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut stack: Vec<&mut Module> = vec![self];
        while let Some(module) = stack.pop() {
            f(module)?;
            stack.extend(module.children.iter_mut().rev());
        }
        Ok(())
    }

    /// Apply `f` to every method graph in the tree, skipping methods named
    /// in `preserved`.
    pub fn for_each_graph_mut<E>(
        &mut self,
        preserved: &[&str],
        f: &mut impl FnMut(&mut Graph) -> Result<(), E>,
    ) -> Result<(), E> {
        self.for_each_module_mut(&mut |module| {
            for method in &mut module.methods {
                if preserved.contains(&method.name.as_str()) {
                    continue;
                }
                f(&mut method.graph)?;
            }
            Ok(())
        })
    }

    pub(crate) fn methods_mut(&mut self) -> &mut [Method] {
        &mut self.methods
    }

    /// Disjoint borrows for passes that rewrite graphs against the
    /// module's own parameter table.
    pub(crate) fn split_methods_and_parameters(
        &mut self,
    ) -> (&mut [Method], &[(String, AttrValue)]) {
        (&mut self.methods, &self.parameters)
    }
}
