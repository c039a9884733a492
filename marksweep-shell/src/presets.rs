use anyhow::{bail, Error};

use crate::session::Session;

/// A predefined object graph, loadable with the shell's `example` command.
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    objects: &'static [&'static str],
    references: &'static [(&'static str, &'static str)],
    roots: &'static [&'static str],
    pub hint: Option<&'static str>,
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "simple",
        description: "simple parent-child relationship",
        objects: &["parent", "child", "orphan"],
        references: &[("parent", "child")],
        roots: &["parent"],
        hint: None,
    },
    Preset {
        name: "circular",
        description: "circular reference demonstration",
        objects: &["A", "B", "C"],
        references: &[("A", "B"), ("B", "C"), ("C", "A")],
        roots: &[],
        hint: Some("A -> B -> C -> A forms a cycle. Without roots, all of it gets collected!"),
    },
    Preset {
        name: "tree",
        description: "tree structure with branches",
        objects: &["root", "branch1", "branch2", "leaf1a", "leaf1b", "leaf2a"],
        references: &[
            ("root", "branch1"),
            ("root", "branch2"),
            ("branch1", "leaf1a"),
            ("branch1", "leaf1b"),
            ("branch2", "leaf2a"),
        ],
        roots: &["root"],
        hint: None,
    },
    Preset {
        name: "web",
        description: "web server request simulation",
        objects: &["app", "db_pool", "request1", "session1"],
        references: &[
            ("app", "db_pool"),
            ("request1", "session1"),
            ("request1", "db_pool"),
        ],
        roots: &["app", "request1"],
        hint: Some("Try: unroot request1, then collect"),
    },
];

/// Finds a preset by name.
pub fn find(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|it| it.name == name)
}

impl Preset {
    /// Clears the session, then builds this preset's graph into it.
    pub fn load(&self, session: &mut Session) -> Result<(), Error> {
        session.clear();
        for name in self.objects {
            let (_, cycle) = session.alloc(name, None)?;
            if cycle.is_some() {
                bail!("the collection threshold is too low to load example '{}'", self.name);
            }
        }
        for (from, to) in self.references {
            session.add_reference(from, to)?;
        }
        for name in self.roots {
            session.add_root(name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_loads() {
        let mut session = Session::new();
        for preset in PRESETS {
            preset.load(&mut session).unwrap();
            assert_eq!(session.heap().len(), preset.objects.len());
            assert_eq!(session.heap().stats().root_objects, preset.roots.len());
        }
    }

    #[test]
    fn circular_preset_is_all_garbage() {
        let mut session = Session::new();
        find("circular").unwrap().load(&mut session).unwrap();

        let (stats, _) = session.collect();

        assert_eq!(stats.collected_objects, 3);
    }

    #[test]
    fn web_preset_keeps_the_shared_pool() {
        let mut session = Session::new();
        find("web").unwrap().load(&mut session).unwrap();

        session.remove_root("request1").unwrap();
        let (_, mut forgotten) = session.collect();
        forgotten.sort();

        assert_eq!(forgotten, vec!["request1", "session1"]);
        assert!(session.lookup("db_pool").is_ok());
    }
}
