use crate::entities::Coordinates;

/// One user gesture against the map surface or its controls.
#[derive(Clone, Debug, PartialEq)]
pub enum ConsoleEvent {
    /// The route dropdown changed; `None` means no route chosen.
    RouteSelected(Option<String>),
    /// Admin clicked the map to stage a bin position.
    PinDropped(Coordinates),
    /// Admin submitted the bin form for the staged position.
    BinSaved { note: String },
    BinEdited { id: i64, note: String },
    BinDeleted { id: i64 },
}

/// Parses one console command line into an event: `route <name>`, `clear`,
/// `pin <lat> <lng>`, `save <note...>`, `edit <id> <note...>`, or
/// `delete <id>`.
pub fn parse_command(line: &str) -> Option<ConsoleEvent> {
    let mut parts = line.split_whitespace();

    match parts.next()? {
        "route" => {
            let name = parts.collect::<Vec<_>>().join(" ");
            if name.is_empty() {
                return None;
            }

            Some(ConsoleEvent::RouteSelected(Some(name)))
        }
        "clear" => Some(ConsoleEvent::RouteSelected(None)),
        "pin" => {
            let latitude = parts.next()?.parse().ok()?;
            let longitude = parts.next()?.parse().ok()?;

            Some(ConsoleEvent::PinDropped(Coordinates::new(
                latitude, longitude,
            )))
        }
        "save" => Some(ConsoleEvent::BinSaved {
            note: parts.collect::<Vec<_>>().join(" "),
        }),
        "edit" => {
            let id = parts.next()?.parse().ok()?;

            Some(ConsoleEvent::BinEdited {
                id,
                note: parts.collect::<Vec<_>>().join(" "),
            })
        }
        "delete" => {
            let id = parts.next()?.parse().ok()?;

            Some(ConsoleEvent::BinDeleted { id })
        }
        _ => None,
    }
}

#[test]
fn commands_parse_into_events() {
    assert_eq!(
        parse_command("route north end"),
        Some(ConsoleEvent::RouteSelected(Some("north end".into())))
    );
    assert_eq!(parse_command("clear"), Some(ConsoleEvent::RouteSelected(None)));
    assert_eq!(
        parse_command("pin 44.66 -63.62"),
        Some(ConsoleEvent::PinDropped(Coordinates::new(44.66, -63.62)))
    );
    assert_eq!(
        parse_command("save behind the depot"),
        Some(ConsoleEvent::BinSaved {
            note: "behind the depot".into()
        })
    );
    assert_eq!(
        parse_command("edit 12 new note"),
        Some(ConsoleEvent::BinEdited {
            id: 12,
            note: "new note".into()
        })
    );
    assert_eq!(
        parse_command("delete 12"),
        Some(ConsoleEvent::BinDeleted { id: 12 })
    );
}

#[test]
fn malformed_commands_are_rejected() {
    assert_eq!(parse_command(""), None);
    assert_eq!(parse_command("route"), None);
    assert_eq!(parse_command("pin 44.66"), None);
    assert_eq!(parse_command("pin here there"), None);
    assert_eq!(parse_command("delete twelve"), None);
    assert_eq!(parse_command("teleport 1"), None);
}
