use serde_json::{json, Value};

/// Raw create-request body for a patient.
#[derive(Debug, Clone)]
pub struct TestPatient {
    pub id: String,
    pub name: String,
    pub city: String,
    pub age: i64,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
}

impl Default for TestPatient {
    fn default() -> Self {
        Self {
            id: "P999".to_string(),
            name: "Test Patient".to_string(),
            city: "Test City".to_string(),
            age: 30,
            gender: "male".to_string(),
            height: 1.75,
            weight: 70.0,
        }
    }
}

impl TestPatient {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    pub fn measured(id: &str, height: f64, weight: f64) -> Self {
        Self {
            id: id.to_string(),
            height,
            weight,
            ..Self::default()
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "city": self.city,
            "age": self.age,
            "gender": self.gender,
            "height": self.height,
            "weight": self.weight,
        })
    }
}

pub struct MockPatientDocuments;

impl MockPatientDocuments {
    /// Four stored patients in insertion order. P001 and P004 share a weight.
    pub fn seeded() -> Value {
        json!({
            "P001": {
                "name": "Ananya Verma",
                "city": "Guwahati",
                "age": 28,
                "gender": "female",
                "height": 1.75,
                "weight": 70.0,
                "bmi": 22.86,
                "verdict": "Normal weight"
            },
            "P002": {
                "name": "Ravi Mehta",
                "city": "Mumbai",
                "age": 35,
                "gender": "male",
                "height": 1.6,
                "weight": 50.0,
                "bmi": 19.53,
                "verdict": "Normal weight"
            },
            "P003": {
                "name": "Sneha Kulkarni",
                "city": "Pune",
                "age": 22,
                "gender": "female",
                "height": 1.8,
                "weight": 95.0,
                "bmi": 29.32,
                "verdict": "Overweight"
            },
            "P004": {
                "name": "Arjun Reddy",
                "city": "Hyderabad",
                "age": 45,
                "gender": "others",
                "height": 1.7,
                "weight": 70.0,
                "bmi": 24.22,
                "verdict": "Normal weight"
            }
        })
    }

    pub fn empty() -> Value {
        json!({})
    }
}
