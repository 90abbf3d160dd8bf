use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundControlEndpoint<'a> {
    RegisterVehicle(&'a str),
    Route,
    Move,
    Arrived,
}

impl GroundControlEndpoint<'_> {
    pub fn path(&self) -> String {
        match self {
            Self::RegisterVehicle(vehicle_type) => format!("/register-vehicle/{}", vehicle_type),
            Self::Route => "/route".to_string(),
            Self::Move => "/move".to_string(),
            Self::Arrived => "/arrived".to_string(),
        }
    }

    // Every ground control call is a POST, including registration.
    pub fn method(&self) -> reqwest::Method {
        reqwest::Method::POST
    }
}

impl fmt::Display for GroundControlEndpoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}
