//! Wire types shared with the console backend
//!
//! Field names follow the backend's camelCase JSON.

use serde::{Deserialize, Serialize};

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expire: u64,
    /// Refresh token lifetime in seconds
    pub refresh_expire: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captcha_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_code: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            captcha_id: None,
            verify_code: None,
        }
    }

    pub fn with_captcha(mut self, captcha_id: impl Into<String>, code: impl Into<String>) -> Self {
        self.captcha_id = Some(captcha_id.into());
        self.verify_code = Some(code.into());
        self
    }
}

/// Identity record of the signed-in operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nick_name: Option<String>,
    #[serde(default)]
    pub head_img: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub remark: Option<String>,
}

impl UserProfile {
    /// Name to show in the UI: nickname, then real name, then username.
    pub fn display_name(&self) -> &str {
        self.nick_name
            .as_deref()
            .or(self.name.as_deref())
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.username)
    }
}

/// Kind of a menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MenuType {
    Directory,
    Menu,
    /// Permission-only entry, never rendered as navigation
    Button,
}

impl TryFrom<u8> for MenuType {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(MenuType::Directory),
            1 => Ok(MenuType::Menu),
            2 => Ok(MenuType::Button),
            other => Err(format!("unknown menu type: {other}")),
        }
    }
}

impl From<MenuType> for u8 {
    fn from(value: MenuType) -> Self {
        match value {
            MenuType::Directory => 0,
            MenuType::Menu => 1,
            MenuType::Button => 2,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A navigable entry granted to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub router: Option<String>,
    #[serde(default)]
    pub perms: Option<String>,
    #[serde(rename = "type")]
    pub menu_type: MenuType,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub order_num: i32,
    #[serde(default)]
    pub view_path: Option<String>,
    #[serde(default = "default_true")]
    pub keep_alive: bool,
    #[serde(default = "default_true")]
    pub is_show: bool,
}

/// Permission codes and menus, fetched together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermMenu {
    #[serde(default)]
    pub perms: Vec<String>,
    #[serde(default)]
    pub menus: Vec<MenuItem>,
}

/// An open UI tab: a route descriptor with every field optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<bool>,
}

impl RouteTag {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_grant_wire_format() {
        let grant: TokenGrant = serde_json::from_str(
            r#"{"token":"T1","refreshToken":"R1","expire":3600,"refreshExpire":604800}"#,
        )
        .unwrap();

        assert_eq!(grant.token, "T1");
        assert_eq!(grant.refresh_token, "R1");
        assert_eq!(grant.expire, 3600);
        assert_eq!(grant.refresh_expire, 604800);
    }

    #[test]
    fn test_credentials_skip_empty_captcha() {
        let json = serde_json::to_value(Credentials::new("u", "p")).unwrap();
        assert_eq!(json, serde_json::json!({"username": "u", "password": "p"}));

        let json = serde_json::to_value(Credentials::new("u", "p").with_captcha("c1", "1234"))
            .unwrap();
        assert_eq!(json["captchaId"], "c1");
        assert_eq!(json["verifyCode"], "1234");
    }

    #[test]
    fn test_menu_item_defaults() {
        let item: MenuItem =
            serde_json::from_str(r#"{"id":3,"name":"Users","type":1,"router":"/sys/user"}"#)
                .unwrap();

        assert_eq!(item.menu_type, MenuType::Menu);
        assert_eq!(item.parent_id, None);
        assert_eq!(item.order_num, 0);
        assert!(item.keep_alive);
        assert!(item.is_show);
    }

    #[test]
    fn test_unknown_menu_type_rejected() {
        let result = serde_json::from_str::<MenuItem>(r#"{"id":1,"name":"x","type":7}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_display_name_fallback() {
        let mut profile = UserProfile {
            id: 1,
            username: "admin".to_string(),
            name: None,
            nick_name: None,
            head_img: None,
            phone: None,
            email: None,
            remark: None,
        };
        assert_eq!(profile.display_name(), "admin");

        profile.name = Some("Ada".to_string());
        assert_eq!(profile.display_name(), "Ada");

        profile.nick_name = Some("ada".to_string());
        assert_eq!(profile.display_name(), "ada");
    }
}
