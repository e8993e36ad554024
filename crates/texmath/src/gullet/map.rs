//! A map of macro definitions that respects TeX grouping.

use std::collections::HashMap;
use std::rc::Rc;

use crate::texmacro::MacroDef;
use crate::token::CsName;

/// What to do with a name at the end of the current group.
#[derive(Debug, Clone)]
enum EndOfGroupAction {
    /// Restore the value the name had when the group began.
    Revert(Rc<MacroDef>),
    /// The name was first defined inside the group; remove it.
    Delete,
}

/// Map from control sequence names to macro definitions.
///
/// Assignments made inside a group are rolled back when the group ends. Each
/// group records, for every name assigned within it, the action needed to
/// restore the name's pre-group meaning; only the first assignment of a name
/// in a group records an action.
#[derive(Debug, Default)]
pub struct MacroMap {
    values: HashMap<CsName, Rc<MacroDef>>,
    groups: Vec<HashMap<CsName, EndOfGroupAction>>,
}

impl MacroMap {
    pub fn new() -> MacroMap {
        Default::default()
    }

    #[inline]
    pub fn get(&self, name: CsName) -> Option<&Rc<MacroDef>> {
        self.values.get(&name)
    }

    #[inline]
    pub fn is_defined(&self, name: CsName) -> bool {
        self.values.contains_key(&name)
    }

    pub fn insert(&mut self, name: CsName, value: Rc<MacroDef>) {
        let previous = self.values.insert(name, value);
        if let Some(group) = self.groups.last_mut() {
            group.entry(name).or_insert_with(|| match previous {
                None => EndOfGroupAction::Delete,
                Some(previous) => EndOfGroupAction::Revert(previous),
            });
        }
    }

    pub fn begin_group(&mut self) {
        self.groups.push(HashMap::new());
    }

    /// End the current group, rolling back its assignments. Returns false if
    /// there is no group to end.
    pub fn end_group(&mut self) -> bool {
        let group = match self.groups.pop() {
            None => return false,
            Some(group) => group,
        };
        for (name, action) in group {
            match action {
                EndOfGroupAction::Revert(value) => {
                    self.values.insert(name, value);
                }
                EndOfGroupAction::Delete => {
                    self.values.remove(&name);
                }
            }
        }
        true
    }

    /// The number of open groups.
    #[inline]
    pub fn group_depth(&self) -> usize {
        self.groups.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texmacro::Replacement;
    use crate::token::Token;

    fn def(c: char) -> Rc<MacroDef> {
        Rc::new(MacroDef::new(
            0,
            None,
            vec![Replacement::Tokens(vec![Token::new_letter(c, 0)])],
        ))
    }

    fn name(u: usize) -> CsName {
        CsName::try_from_usize(u).unwrap()
    }

    #[test]
    fn assignment_in_group_is_rolled_back() {
        let mut map = MacroMap::new();
        map.insert(name(1), def('a'));
        map.begin_group();
        map.insert(name(1), def('b'));
        map.insert(name(2), def('c'));
        assert_eq!(map.get(name(1)), Some(&def('b')));
        assert!(map.end_group());
        assert_eq!(map.get(name(1)), Some(&def('a')));
        assert_eq!(map.get(name(2)), None);
    }

    #[test]
    fn first_assignment_per_group_wins_rollback() {
        let mut map = MacroMap::new();
        map.insert(name(1), def('a'));
        map.begin_group();
        map.insert(name(1), def('b'));
        map.insert(name(1), def('c'));
        map.end_group();
        assert_eq!(map.get(name(1)), Some(&def('a')));
    }

    #[test]
    fn nested_groups() {
        let mut map = MacroMap::new();
        map.begin_group();
        map.insert(name(1), def('a'));
        map.begin_group();
        map.insert(name(1), def('b'));
        map.end_group();
        assert_eq!(map.get(name(1)), Some(&def('a')));
        map.end_group();
        assert_eq!(map.get(name(1)), None);
    }

    #[test]
    fn end_group_without_group_fails() {
        let mut map = MacroMap::new();
        assert!(!map.end_group());
    }
}
