//! Разбор структурированных имён объектов: `group#tag_instance` или `group_instance`.

use serde::{Deserialize, Serialize};

/// Результат разбора имени
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NameInfo {
    pub group_id: String,
    pub tags: Vec<String>,
    pub instance_id: String,
}

/// Разбирает имя объекта.
///
/// - `group#tag_instance`: группа до первого `#`, тег до первого `_` после него,
///   экземпляр: остаток.
/// - `group_instance`: разделение по последнему `_`.
/// - иначе всё имя: группа.
pub fn parse_name(name: &str) -> NameInfo {
    if let Some(info) = parse_tagged(name) {
        return info;
    }
    if let Some(info) = parse_instanced(name) {
        return info;
    }
    NameInfo {
        group_id: name.to_string(),
        tags: Vec::new(),
        instance_id: String::new(),
    }
}

fn parse_tagged(name: &str) -> Option<NameInfo> {
    let (group, rest) = name.split_once('#')?;
    let (tag, instance) = rest.split_once('_')?;
    if group.is_empty()
        || tag.is_empty()
        || instance.is_empty()
        || instance.contains(is_line_break)
    {
        return None;
    }
    Some(NameInfo {
        group_id: group.to_string(),
        tags: vec![tag.to_string()],
        instance_id: instance.to_string(),
    })
}

fn parse_instanced(name: &str) -> Option<NameInfo> {
    let (group, instance) = name.rsplit_once('_')?;
    if group.is_empty() || instance.is_empty() || group.contains(is_line_break) {
        return None;
    }
    Some(NameInfo {
        group_id: group.to_string(),
        tags: Vec::new(),
        instance_id: instance.to_string(),
    })
}

/// Переводы строк, включая `\r` и разделители строк/абзацев Unicode
fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}
