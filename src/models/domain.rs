use serde::{Deserialize, Serialize};

/// Lifecycle of an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExchangeState {
    New,
    Started,
    Generated,
    Sent,
}

impl ExchangeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeState::New => "NEW",
            ExchangeState::Started => "STARTED",
            ExchangeState::Generated => "GENERATED",
            ExchangeState::Sent => "SENT",
        }
    }
}

/// Format used when rendering notification emails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EmailFormat {
    Plaintext,
    Html,
    Multipart,
}

impl std::str::FromStr for EmailFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "PLAINTEXT" => Ok(EmailFormat::Plaintext),
            "HTML" => Ok(EmailFormat::Html),
            "MULTIPART" => Ok(EmailFormat::Multipart),
            other => Err(format!("unknown email format: {}", other)),
        }
    }
}

/// Person running the exchange; receives replies to notification emails
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organizer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl Organizer {
    pub fn new(name: &str, email_address: &str, phone_number: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            email_address: Some(email_address.to_string()),
            phone_number: Some(phone_number.to_string()),
        }
    }
}

/// Email template overrides, set at exchange or participant level
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfig {
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub email_format: Option<EmailFormat>,
    #[serde(default)]
    pub template_group: Option<String>,
    #[serde(default)]
    pub template_name: Option<String>,
}

/// A person entered into an exchange
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub template_overrides: TemplateConfig,
    /// Ids of participants this one must never be assigned to give to
    #[serde(default)]
    pub conflicts: Vec<i64>,
}

impl Participant {
    pub fn new(id: i64, name: &str, nickname: &str, email_address: &str) -> Self {
        Self {
            id: Some(id),
            name: Some(name.to_string()),
            nickname: Some(nickname.to_string()),
            email_address: Some(email_address.to_string()),
            template_overrides: TemplateConfig::default(),
            conflicts: Vec::new(),
        }
    }

    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Add a conflict, ignoring ids that are already present
    pub fn add_conflict(&mut self, participant_id: i64) {
        if !self.conflicts.contains(&participant_id) {
            self.conflicts.push(participant_id);
        }
    }

    pub fn remove_conflict(&mut self, participant_id: i64) {
        if let Some(index) = self.conflicts.iter().position(|id| *id == participant_id) {
            self.conflicts.remove(index);
        }
    }

    pub fn conflicts_with(&self, other: &Participant) -> bool {
        other.id.is_some_and(|id| self.conflicts.contains(&id))
    }
}

/// Ordered list of participants, unique by participant id once validated
pub type ParticipantSet = Vec<Participant>;

/// One giver -> receiver pairing; order matters for equality
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub gift_giver: Participant,
    pub gift_receiver: Participant,
}

impl Assignment {
    pub fn new(gift_giver: Participant, gift_receiver: Participant) -> Self {
        Self {
            gift_giver,
            gift_receiver,
        }
    }
}

/// Complete set of assignments for an exchange
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentSet(Vec<Assignment>);

impl AssignmentSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, assignment: Assignment) {
        self.0.push(assignment);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Assignment> {
        self.0.iter()
    }

    /// Who gives a gift to this participant?
    pub fn gift_giver(&self, gift_receiver: &Participant) -> Option<&Participant> {
        let receiver_id = gift_receiver.id?;
        self.0
            .iter()
            .find(|assignment| assignment.gift_receiver.id == Some(receiver_id))
            .map(|assignment| &assignment.gift_giver)
    }

    /// Who does this participant give a gift to?
    pub fn gift_receiver(&self, gift_giver: &Participant) -> Option<&Participant> {
        let giver_id = gift_giver.id?;
        self.0
            .iter()
            .find(|assignment| assignment.gift_giver.id == Some(giver_id))
            .map(|assignment| &assignment.gift_receiver)
    }
}

impl From<Vec<Assignment>> for AssignmentSet {
    fn from(assignments: Vec<Assignment>) -> Self {
        Self(assignments)
    }
}

impl<'a> IntoIterator for &'a AssignmentSet {
    type Item = &'a Assignment;
    type IntoIter = std::slice::Iter<'a, Assignment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A single Secret Santa event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub exchange_state: Option<ExchangeState>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date_and_time: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub cost: Option<String>,
    #[serde(default)]
    pub extra_info: Option<String>,
    #[serde(default)]
    pub organizer: Organizer,
    #[serde(default)]
    pub template_overrides: TemplateConfig,
    #[serde(default)]
    pub participants: ParticipantSet,
    /// Present once assignments have been generated
    #[serde(default)]
    pub assignments: Option<AssignmentSet>,
}

impl Exchange {
    /// One more than the largest existing participant id, ignoring negative ids.
    /// Stays at `i64::MAX` once an id reaches it.
    pub fn next_participant_id(&self) -> i64 {
        let largest = self
            .participants
            .iter()
            .filter_map(|participant| participant.id)
            .filter(|id| *id > 0)
            .max()
            .unwrap_or(0);
        largest.saturating_add(1)
    }

    /// Replace the participant sharing this participant's id.
    ///
    /// Returns false without touching the exchange when the id is missing
    /// or unknown.
    pub fn replace_participant(&mut self, participant: Participant) -> bool {
        let Some(id) = participant.id else {
            return false;
        };

        match self.participants.iter().position(|p| p.id == Some(id)) {
            Some(index) => {
                self.participants[index] = participant;
                true
            }
            None => false,
        }
    }

    /// Remove the participant sharing this participant's id.
    pub fn remove_participant(&mut self, participant: &Participant) -> bool {
        let Some(id) = participant.id else {
            return false;
        };

        match self.participants.iter().position(|p| p.id == Some(id)) {
            Some(index) => {
                self.participants.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn participant_by_id(&self, participant_id: i64) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|participant| participant.id == Some(participant_id))
    }
}

/// Search criteria for exchanges
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeCriteria {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub exchange_ids: Option<Vec<i64>>,
}

impl ExchangeCriteria {
    pub fn for_user(user_id: &str) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            exchange_ids: None,
        }
    }
}
