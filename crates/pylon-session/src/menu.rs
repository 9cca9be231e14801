//! Navigation tree built from the flat menu list

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::types::{MenuItem, MenuType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuNode {
    #[serde(flatten)]
    pub item: MenuItem,
    pub children: Vec<MenuNode>,
}

/// Arranges visible directory and menu entries by `parent_id`.
///
/// Buttons and hidden entries are dropped. Entries whose parent is not in
/// the visible set become roots. Siblings are ordered by `order_num`,
/// keeping the backend's order for ties.
pub fn build_menu_tree(menus: &[MenuItem]) -> Vec<MenuNode> {
    let visible: Vec<&MenuItem> = menus
        .iter()
        .filter(|m| m.menu_type != MenuType::Button && m.is_show)
        .collect();
    let ids: HashSet<i64> = visible.iter().map(|m| m.id).collect();

    let mut roots = Vec::new();
    let mut children: HashMap<i64, Vec<&MenuItem>> = HashMap::new();
    for item in visible {
        match item.parent_id {
            Some(parent) if ids.contains(&parent) && parent != item.id => {
                children.entry(parent).or_default().push(item);
            }
            _ => roots.push(item),
        }
    }

    attach(roots, &children)
}

fn attach(mut level: Vec<&MenuItem>, children: &HashMap<i64, Vec<&MenuItem>>) -> Vec<MenuNode> {
    level.sort_by_key(|m| m.order_num);
    level
        .into_iter()
        .map(|item| MenuNode {
            item: item.clone(),
            children: children
                .get(&item.id)
                .map(|kids| attach(kids.clone(), children))
                .unwrap_or_default(),
        })
        .collect()
}
