use std::collections::HashSet;
use std::fmt;

use itertools::Itertools;

use super::{Graph, ValueId};

impl Graph {
    /// Unique printable name per live value. Explicit names win; unnamed or
    /// clashing values fall back to `v{id}`.
    fn display_names(&self) -> Vec<Option<String>> {
        let mut taken: HashSet<String> = HashSet::new();
        let mut names: Vec<Option<String>> = vec![None; self.values.len()];
        let declared = self.inputs.iter().copied().chain(
            self.order.iter().flat_map(|&n| self.node(n).outputs.iter().copied()),
        );
        for v in declared {
            let mut candidate = match &self.value(v).name {
                Some(name) => name.clone(),
                None => format!("v{}", v.raw()),
            };
            while !taken.insert(candidate.clone()) {
                candidate.push('_');
            }
            names[v.index()] = Some(candidate);
        }
        names
    }
}

fn decl(g: &Graph, names: &[Option<String>], v: ValueId) -> String {
    let name = names[v.index()].as_deref().unwrap_or("?");
    match &g.value(v).ty {
        Some(ty) => format!("%{name} : {ty}"),
        None => format!("%{name}"),
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.display_names();
        let reference = |v: ValueId| format!("%{}", names[v.index()].as_deref().unwrap_or("?"));

        writeln!(f, "graph({}):", self.inputs.iter().map(|&v| decl(self, &names, v)).join(", "))?;
        for &id in &self.order {
            let node = self.node(id);
            f.write_str("    ")?;
            if !node.outputs.is_empty() {
                write!(f, "{} = ", node.outputs.iter().map(|&v| decl(self, &names, v)).join(", "))?;
            }
            write!(f, "{}", node.kind)?;
            if !node.attrs.is_empty() {
                write!(f, "[{}]", node.attrs.iter().map(|(k, v)| format!("{k}={v}")).join(", "))?;
            }
            writeln!(f, "({})", node.inputs.iter().copied().map(&reference).join(", "))?;
        }
        writeln!(f, "    return ({})", self.outputs.iter().copied().map(&reference).join(", "))
    }
}
