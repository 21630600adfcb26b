//! Account entity owned by the account store.

use serde::{Deserialize, Serialize};

use crate::persistence::Entity;

/// Local id of the single account this process holds.
pub const DEFAULT_ACCOUNT_ID: &str = "default";

/// Account info and account settings, merged into one entity.
///
/// The two halves arrive from independent fetches; `copy_account_attributes`
/// and `copy_account_settings_attributes` apply one half without touching the
/// fields only the other half owns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountModel {
    // Account info
    pub user_id: i64,
    pub user_name: String,
    pub email: String,
    pub display_name: String,
    pub profile_url: String,
    pub avatar_url: String,
    pub primary_site_id: i64,
    pub site_count: u32,
    pub visible_site_count: u32,
    pub date: String,

    // Account settings
    pub first_name: String,
    pub last_name: String,
    pub about_me: String,
    pub new_email: String,
    pub pending_email_change: bool,
    pub web_address: String,
}

impl AccountModel {
    pub fn copy_account_attributes(&mut self, other: &AccountModel) {
        self.user_id = other.user_id;
        self.user_name = other.user_name.clone();
        self.email = other.email.clone();
        self.display_name = other.display_name.clone();
        self.profile_url = other.profile_url.clone();
        self.avatar_url = other.avatar_url.clone();
        self.primary_site_id = other.primary_site_id;
        self.site_count = other.site_count;
        self.visible_site_count = other.visible_site_count;
        self.date = other.date.clone();
    }

    pub fn copy_account_settings_attributes(&mut self, other: &AccountModel) {
        self.first_name = other.first_name.clone();
        self.last_name = other.last_name.clone();
        self.about_me = other.about_me.clone();
        self.new_email = other.new_email.clone();
        self.pending_email_change = other.pending_email_change;
        self.web_address = other.web_address.clone();
    }
}

impl Entity for AccountModel {
    const COLLECTION: &'static str = "accounts";

    fn id(&self) -> String {
        DEFAULT_ACCOUNT_ID.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> AccountModel {
        AccountModel {
            user_id: 42,
            user_name: "alice".into(),
            email: "alice@example.com".into(),
            visible_site_count: 2,
            first_name: "ignored".into(),
            ..AccountModel::default()
        }
    }

    fn settings() -> AccountModel {
        AccountModel {
            first_name: "Alice".into(),
            about_me: "hi".into(),
            user_name: "ignored".into(),
            ..AccountModel::default()
        }
    }

    #[test]
    fn halves_merge_independently_of_order() {
        let mut a = AccountModel::default();
        a.copy_account_attributes(&info());
        a.copy_account_settings_attributes(&settings());

        let mut b = AccountModel::default();
        b.copy_account_settings_attributes(&settings());
        b.copy_account_attributes(&info());

        assert_eq!(a, b);
        assert_eq!(a.user_name, "alice");
        assert_eq!(a.first_name, "Alice");
        assert_eq!(a.visible_site_count, 2);
    }

    #[test]
    fn settings_copy_leaves_account_info_untouched() {
        let mut account = info();
        account.copy_account_settings_attributes(&settings());
        assert_eq!(account.user_id, 42);
        assert_eq!(account.email, "alice@example.com");
    }
}
