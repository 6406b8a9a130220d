use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    Name,
    Email,
    Phone,
}

impl ContactField {
    pub const ALL: [ContactField; 3] =
        [ContactField::Name, ContactField::Email, ContactField::Phone];

    pub fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }
}

/// Contact details captured after a quote. Free text; nothing here is
/// validated, the checkout service owns that.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl CustomerDetails {
    pub fn set(&mut self, field: ContactField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ContactField::Name => self.name = value,
            ContactField::Email => self.email = value,
            ContactField::Phone => self.phone = value,
        }
    }

    pub fn get(&self, field: ContactField) -> &str {
        match field {
            ContactField::Name => &self.name,
            ContactField::Email => &self.email,
            ContactField::Phone => &self.phone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ContactField, CustomerDetails};

    #[test]
    fn set_overwrites_only_the_named_field() {
        let mut details = CustomerDetails::default();
        details.set(ContactField::Name, "Ada");
        details.set(ContactField::Email, "not-an-email");
        details.set(ContactField::Name, "Grace");

        assert_eq!(details.get(ContactField::Name), "Grace");
        assert_eq!(details.get(ContactField::Email), "not-an-email");
        assert_eq!(details.get(ContactField::Phone), "");
    }
}
