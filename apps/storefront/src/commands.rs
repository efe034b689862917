//! Input lines parsed into screen actions.

use shared::{
    domain::{Group, LocationId, Price},
    error::StorefrontError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SignUp { email: String, password: String },
    Login { email: String, password: String },
    Logout,
    WhoAmI,
    Add { group: Group, price: Price, name: String },
    Increase { group: Group, name: String },
    Decrease { group: Group, name: String },
    Clear,
    Show,
    Checkout,
    Locations,
    Pick { location_id: LocationId },
    Order,
    Confirm,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  signup <email> <password>       create an account
  login <email> <password>        sign in
  logout | whoami
  add <group> <price> <name...>   add one item (group: ingredients | sauces)
  inc <group> <name...>           one more of an item
  dec <group> <name...>           one less of an item (removes at zero)
  clear                           start a new bowl
  show                            print the current order
  checkout                        hand the order to checkout
  locations                       list pickup locations
  pick <id>                       choose a pickup location
  order                           place the order
  confirm                         show the confirmation and finish
  help | quit";

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SignUp { .. } => "signup",
            Command::Login { .. } => "login",
            Command::Logout => "logout",
            Command::WhoAmI => "whoami",
            Command::Add { .. } => "add",
            Command::Increase { .. } => "inc",
            Command::Decrease { .. } => "dec",
            Command::Clear => "clear",
            Command::Show => "show",
            Command::Checkout => "checkout",
            Command::Locations => "locations",
            Command::Pick { .. } => "pick",
            Command::Order => "order",
            Command::Confirm => "confirm",
            Command::Help => "help",
            Command::Quit => "quit",
        }
    }
}

fn usage(text: &str) -> StorefrontError {
    StorefrontError::invalid_input(format!("usage: {text}"))
}

fn item_name(words: &[&str], text: &str) -> Result<String, StorefrontError> {
    if words.is_empty() {
        return Err(usage(text));
    }
    Ok(words.join(" "))
}

/// Parses one input line; blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, StorefrontError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((head, rest)) = words.split_first() else {
        return Ok(None);
    };

    let command = match (head.to_ascii_lowercase().as_str(), rest) {
        ("signup", [email, password]) => Command::SignUp {
            email: email.to_string(),
            password: password.to_string(),
        },
        ("signup", _) => return Err(usage("signup <email> <password>")),
        ("login", [email, password]) => Command::Login {
            email: email.to_string(),
            password: password.to_string(),
        },
        ("login", _) => return Err(usage("login <email> <password>")),
        ("logout", []) => Command::Logout,
        ("whoami", []) => Command::WhoAmI,
        ("add", [group, price, name @ ..]) => Command::Add {
            group: group.parse()?,
            price: price.parse()?,
            name: item_name(name, "add <group> <price> <name...>")?,
        },
        ("add", _) => return Err(usage("add <group> <price> <name...>")),
        ("inc", [group, name @ ..]) => Command::Increase {
            group: group.parse()?,
            name: item_name(name, "inc <group> <name...>")?,
        },
        ("dec", [group, name @ ..]) => Command::Decrease {
            group: group.parse()?,
            name: item_name(name, "dec <group> <name...>")?,
        },
        ("inc", _) | ("dec", _) => return Err(usage("inc|dec <group> <name...>")),
        ("clear", []) => Command::Clear,
        ("show", []) => Command::Show,
        ("checkout", []) => Command::Checkout,
        ("locations", []) => Command::Locations,
        ("pick", [id]) => Command::Pick {
            location_id: LocationId(id.parse().map_err(|_| {
                StorefrontError::invalid_input(format!("'{id}' is not a location id"))
            })?),
        },
        ("pick", _) => return Err(usage("pick <id>")),
        ("order", []) => Command::Order,
        ("confirm", []) => Command::Confirm,
        ("help", _) | ("?", _) => Command::Help,
        ("quit", []) | ("exit", []) => Command::Quit,
        (other, _) => {
            return Err(StorefrontError::invalid_input(format!(
                "unknown command '{other}' (try 'help')"
            )))
        }
    };
    Ok(Some(command))
}
