//! Notification types
//!
//! This module defines the outbound request the membership core hands to a
//! notification collaborator when an invitation is created.

use chrono::{DateTime, Utc};
use roster_org::{Invitation, Organization, User, UserRole};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Invitation notice for the invitee.
///
/// Carries everything a delivery channel needs to render and address the
/// message. The acceptance URL embeds the invitation token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationNotice {
    /// Unique notice ID
    pub id: Uuid,

    /// Invitation the notice is about
    pub invitation_id: Uuid,

    /// Organization context
    pub organization_id: Uuid,

    /// Invitee email
    pub recipient_email: String,

    /// Invitee given name
    pub recipient_first_name: String,

    /// Invitee family name
    pub recipient_last_name: String,

    /// Organization name
    pub organization_name: String,

    /// Full name of the inviting user
    pub inviter_full_name: String,

    /// Role offered
    pub role: UserRole,

    /// Link to the acceptance page, including the token
    pub acceptance_url: String,

    /// Hours until the invitation expires
    pub expiration_hours: i64,

    /// When the notice was created
    pub created_at: DateTime<Utc>,
}

impl InvitationNotice {
    /// Build the notice for a freshly created invitation.
    ///
    /// # Arguments
    ///
    /// * `invitation` - The persisted invitation
    /// * `organization` - The invitation's organization
    /// * `inviter` - The user who sent the invitation
    /// * `acceptance_url` - Base URL joined with the invitation token
    pub fn for_invitation(
        invitation: &Invitation,
        organization: &Organization,
        inviter: &User,
        acceptance_url: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            invitation_id: invitation.id,
            organization_id: organization.id,
            recipient_email: invitation.email.clone(),
            recipient_first_name: invitation.first_name.clone(),
            recipient_last_name: invitation.last_name.clone(),
            organization_name: organization.name.clone(),
            inviter_full_name: inviter.full_name(),
            role: invitation.role,
            acceptance_url: acceptance_url.into(),
            expiration_hours: invitation.lifetime_hours(),
            created_at: invitation.created_at,
        }
    }

    /// Message subject line.
    pub fn subject(&self) -> String {
        format!("You've been invited to join {}", self.organization_name)
    }

    /// Plain-text message body.
    pub fn body(&self) -> String {
        format!(
            "Hello {} {},\n\n\
             You have been invited to join {} as a {}.\n\n\
             Click the following link to accept the invitation:\n{}\n\n\
             This invitation will expire in {} hours.\n\n\
             Best regards,\n{}",
            self.recipient_first_name,
            self.recipient_last_name,
            self.organization_name,
            self.role.as_str(),
            self.acceptance_url,
            self.expiration_hours,
            self.inviter_full_name,
        )
    }

    /// Get the topic for this notice.
    pub fn topic(&self) -> &'static str {
        "membership.invitation.created"
    }

    /// Serialize the notice as a JSON payload.
    pub fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Payload safe to write to logs.
    ///
    /// Drops the acceptance URL: the token it carries is enough to redeem the
    /// invitation.
    pub fn log_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        let mut payload = self.to_payload()?;
        if let serde_json::Value::Object(fields) = &mut payload {
            fields.remove("acceptance_url");
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use roster_org::InviteRequest;

    fn notice() -> InvitationNotice {
        let org = Organization::new("Acme");
        let inviter = User::new(org.id, "ada", "ada@acme.test", UserRole::Admin).with_name("Ada", "Lovelace");
        let invitation = Invitation::new(
            InviteRequest::new("bob@acme.test", "Bob", "Builder", UserRole::UnpaidAdmin),
            org.id,
            inviter.id,
            "tok123",
            Utc::now(),
            Duration::hours(48),
        );
        InvitationNotice::for_invitation(
            &invitation,
            &org,
            &inviter,
            "https://app.test/accept-invitation?token=tok123",
        )
    }

    #[test]
    fn test_notice_fields() {
        let notice = notice();
        assert_eq!(notice.recipient_email, "bob@acme.test");
        assert_eq!(notice.inviter_full_name, "Ada Lovelace");
        assert_eq!(notice.expiration_hours, 48);
        assert_eq!(notice.subject(), "You've been invited to join Acme");
    }

    #[test]
    fn test_body_rendering() {
        let body = notice().body();
        assert!(body.starts_with("Hello Bob Builder,"));
        assert!(body.contains("join Acme as a unpaid_admin."));
        assert!(body.contains("https://app.test/accept-invitation?token=tok123"));
        assert!(body.contains("expire in 48 hours"));
        assert!(body.ends_with("Best regards,\nAda Lovelace"));
    }

    #[test]
    fn test_payload() {
        let payload = notice().to_payload().unwrap();
        assert_eq!(payload["organization_name"], "Acme");
        assert_eq!(payload["role"], "unpaid_admin");
    }

    #[test]
    fn test_log_payload_omits_token() {
        let notice = notice();
        assert!(notice.to_payload().unwrap().to_string().contains("tok123"));

        let logged = notice.log_payload().unwrap();
        assert!(logged.get("acceptance_url").is_none());
        assert!(!logged.to_string().contains("tok123"));
        assert_eq!(logged["recipient_email"], "bob@acme.test");
        assert_eq!(logged["invitation_id"], notice.invitation_id.to_string());
    }
}
