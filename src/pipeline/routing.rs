//! Routing engine: maps an analysis to a department and a set of actions.
//!
//! Routing is a pure function of the category (and, for complaints, the
//! sentiment). It never calls the completion capability and cannot fail.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::types::{AnalysisResult, Entities};
use crate::analysis::vocab::{Category, Intent, Sentiment};
use crate::email::types::EmailMetadata;

/// Destination of a routed email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Department {
    Fraud,
    Loan,
    CustomerService,
    DisputeResolution,
    Mortgage,
    CustomerRelations,
    ProductDevelopment,
    /// Catch-all for categories outside the known vocabulary.
    GeneralInquiry,
}

impl Department {
    pub const ALL: [Department; 8] = [
        Self::Fraud,
        Self::Loan,
        Self::CustomerService,
        Self::DisputeResolution,
        Self::Mortgage,
        Self::CustomerRelations,
        Self::ProductDevelopment,
        Self::GeneralInquiry,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fraud => "Fraud Department",
            Self::Loan => "Loan Department",
            Self::CustomerService => "Customer Service Department",
            Self::DisputeResolution => "Dispute Resolution Department",
            Self::Mortgage => "Mortgage Department",
            Self::CustomerRelations => "Customer Relations Department",
            Self::ProductDevelopment => "Product Development Department",
            Self::GeneralInquiry => "General Inquiry Department",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name() == name)
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Department {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Department {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown department: {name}")))
    }
}

/// Downstream system a ticket would be opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketSystem {
    #[serde(rename = "CRM")]
    Crm,
    LoanOriginationSystem,
    DisputeTrackingSystem,
    MortgageOriginationSystem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
}

/// Template of an acknowledgment sent back to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckType {
    FraudReportReceived,
    AccountInquiryReceived,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTicket {
    pub system: TicketSystem,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgment {
    #[serde(rename = "type")]
    pub kind: AckType,
    /// Recipient, copied from the sender header.
    pub to: String,
}

/// Actions triggered by a routing decision; each appears at most once.
///
/// Descriptive records only: nothing here is executed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_ticket: Option<CreateTicket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_acknowledgment: Option<Acknowledgment>,
    /// Present only when set; `Some(true)` is the only value routing produces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalate: Option<bool>,
}

impl Actions {
    pub fn is_empty(&self) -> bool {
        self.create_ticket.is_none() && self.send_acknowledgment.is_none() && self.escalate.is_none()
    }

    /// Names of the triggered actions, for logging.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.create_ticket.is_some() {
            names.push("create_ticket");
        }
        if self.send_acknowledgment.is_some() {
            names.push("send_acknowledgment");
        }
        if self.escalate.is_some() {
            names.push("escalate");
        }
        names
    }

    fn ticket(system: TicketSystem, priority: Priority) -> Self {
        Self {
            create_ticket: Some(CreateTicket { system, priority }),
            ..Self::default()
        }
    }

    fn acknowledge(mut self, kind: AckType, to: &str) -> Self {
        self.send_acknowledgment = Some(Acknowledgment {
            kind,
            to: to.to_string(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub destination: Department,
    pub actions: Actions,
}

/// Route one analysed email.
///
/// Intent, entities and summary are accepted for future rules; only the
/// category, the sentiment (for complaints) and the sender are consulted.
pub fn route(
    category: &Category,
    _entities: &Entities,
    intent: &Intent,
    sentiment: &Sentiment,
    _summary: &str,
    metadata: &EmailMetadata,
) -> RoutingDecision {
    let sender = metadata.sender.as_str();
    let (destination, actions) = match category {
        Category::FraudReport => (
            Department::Fraud,
            Actions::ticket(TicketSystem::Crm, Priority::High)
                .acknowledge(AckType::FraudReportReceived, sender),
        ),
        Category::LoanApplication => (
            Department::Loan,
            Actions::ticket(TicketSystem::LoanOriginationSystem, Priority::Medium),
        ),
        Category::AccountInquiry => (
            Department::CustomerService,
            Actions::default().acknowledge(AckType::AccountInquiryReceived, sender),
        ),
        Category::TransactionDispute => (
            Department::DisputeResolution,
            Actions::ticket(TicketSystem::DisputeTrackingSystem, Priority::High),
        ),
        Category::MortgageInquiry => (
            Department::Mortgage,
            Actions::ticket(TicketSystem::MortgageOriginationSystem, Priority::Medium),
        ),
        Category::ServiceRequest => (
            Department::CustomerService,
            Actions::ticket(TicketSystem::Crm, Priority::Medium),
        ),
        Category::Complaint => {
            let mut actions = Actions::ticket(TicketSystem::Crm, Priority::High);
            if *sentiment == Sentiment::Negative {
                actions.escalate = Some(true);
            }
            (Department::CustomerRelations, actions)
        }
        Category::Feedback => (Department::ProductDevelopment, Actions::default()),
        Category::GeneralInquiry => (Department::CustomerService, Actions::default()),
        Category::Unrecognized(_) => (Department::GeneralInquiry, Actions::default()),
    };

    info!(
        destination = %destination,
        actions = ?actions.names(),
        category = %category,
        intent = %intent,
        sentiment = %sentiment,
        "Routed email"
    );

    RoutingDecision {
        destination,
        actions,
    }
}

/// [`route`] over a whole [`AnalysisResult`].
pub fn route_analysis(analysis: &AnalysisResult, metadata: &EmailMetadata) -> RoutingDecision {
    route(
        &analysis.category,
        &analysis.entities,
        &analysis.intent,
        &analysis.sentiment,
        &analysis.summary,
        metadata,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::default_entities;

    fn metadata(sender: &str) -> EmailMetadata {
        EmailMetadata {
            sender: sender.to_string(),
            subject: "s".into(),
            timestamp: "t".into(),
            attachments: vec![],
        }
    }

    fn route_simple(category: Category, sentiment: Sentiment) -> RoutingDecision {
        route(
            &category,
            &default_entities(),
            &Intent::SeekHelp,
            &sentiment,
            "summary",
            &metadata("a@b.com"),
        )
    }

    #[test]
    fn fraud_report_opens_ticket_and_acknowledges() {
        let decision = route_simple(Category::FraudReport, Sentiment::Neutral);
        assert_eq!(decision.destination, Department::Fraud);
        assert_eq!(
            decision.actions.create_ticket,
            Some(CreateTicket {
                system: TicketSystem::Crm,
                priority: Priority::High
            })
        );
        assert_eq!(
            decision.actions.send_acknowledgment,
            Some(Acknowledgment {
                kind: AckType::FraudReportReceived,
                to: "a@b.com".into()
            })
        );
        assert_eq!(decision.actions.escalate, None);
    }

    #[test]
    fn fraud_report_serializes_as_action_map() {
        let decision = route_simple(Category::FraudReport, Sentiment::Neutral);
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "destination": "Fraud Department",
                "actions": {
                    "create_ticket": {"system": "CRM", "priority": "High"},
                    "send_acknowledgment": {"type": "FraudReportReceived", "to": "a@b.com"}
                }
            })
        );
    }

    #[test]
    fn complaint_escalates_only_when_negative() {
        let negative = route_simple(Category::Complaint, Sentiment::Negative);
        assert_eq!(negative.destination, Department::CustomerRelations);
        assert_eq!(negative.actions.escalate, Some(true));

        let positive = route_simple(Category::Complaint, Sentiment::Positive);
        assert_eq!(positive.actions.escalate, None);
        let json = serde_json::to_value(&positive.actions).unwrap();
        assert!(json.get("escalate").is_none());
        assert_eq!(json["create_ticket"]["priority"], "High");
    }

    #[test]
    fn complaint_with_unrecognized_sentiment_does_not_escalate() {
        let decision = route_simple(
            Category::Complaint,
            Sentiment::Unrecognized("negative".into()),
        );
        assert_eq!(decision.actions.escalate, None);
    }

    #[test]
    fn unknown_category_goes_to_general_inquiry_department() {
        let decision = route_simple(Category::Unrecognized("Billing".into()), Sentiment::Neutral);
        assert_eq!(decision.destination, Department::GeneralInquiry);
        assert!(decision.actions.is_empty());
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["destination"], "General Inquiry Department");
        assert_eq!(json["actions"], serde_json::json!({}));
    }

    #[test]
    fn table_destinations() {
        let cases = [
            (Category::LoanApplication, Department::Loan),
            (Category::AccountInquiry, Department::CustomerService),
            (Category::TransactionDispute, Department::DisputeResolution),
            (Category::MortgageInquiry, Department::Mortgage),
            (Category::ServiceRequest, Department::CustomerService),
            (Category::Feedback, Department::ProductDevelopment),
            (Category::GeneralInquiry, Department::CustomerService),
        ];
        for (category, expected) in cases {
            let decision = route_simple(category.clone(), Sentiment::Neutral);
            assert_eq!(decision.destination, expected, "{category}");
        }
    }

    #[test]
    fn table_actions() {
        let loan = route_simple(Category::LoanApplication, Sentiment::Neutral).actions;
        assert_eq!(loan.names(), vec!["create_ticket"]);
        assert_eq!(
            loan.create_ticket.map(|t| (t.system, t.priority)),
            Some((TicketSystem::LoanOriginationSystem, Priority::Medium))
        );

        let inquiry = route_simple(Category::AccountInquiry, Sentiment::Neutral).actions;
        assert_eq!(inquiry.names(), vec!["send_acknowledgment"]);

        let dispute = route_simple(Category::TransactionDispute, Sentiment::Neutral).actions;
        assert_eq!(
            dispute.create_ticket.map(|t| t.system),
            Some(TicketSystem::DisputeTrackingSystem)
        );

        let service = route_simple(Category::ServiceRequest, Sentiment::Negative).actions;
        assert_eq!(
            service.create_ticket,
            Some(CreateTicket {
                system: TicketSystem::Crm,
                priority: Priority::Medium
            })
        );
        assert_eq!(service.escalate, None);

        assert!(route_simple(Category::Feedback, Sentiment::Negative).actions.is_empty());
        assert!(route_simple(Category::GeneralInquiry, Sentiment::Neutral).actions.is_empty());
    }

    #[test]
    fn route_analysis_uses_result_fields() {
        let mut analysis = AnalysisResult::fallback();
        analysis.category = Category::AccountInquiry;
        let decision = route_analysis(&analysis, &metadata("John <john@x.com>"));
        assert_eq!(decision.destination, Department::CustomerService);
        assert_eq!(
            decision.actions.send_acknowledgment.map(|a| a.to),
            Some("John <john@x.com>".to_string())
        );
    }

    #[test]
    fn department_names_roundtrip() {
        for department in Department::ALL {
            assert_eq!(Department::from_name(department.name()), Some(department));
        }
        assert_eq!(Department::from_name("Nowhere"), None);
    }
}
