// Outbound message templates (email subject/body pairs and SMS text)

use crate::domain::Queue;

fn location_of(queue: &Queue) -> &str {
    queue.location.as_deref().unwrap_or("the service location")
}

pub fn welcome_sms(name: &str) -> String {
    format!(
        "Welcome to Lineup, {name}! You can now join queues and get \
         real-time position updates."
    )
}

pub fn welcome_email(name: &str) -> (String, String) {
    (
        "Welcome to Lineup".to_string(),
        format!(
            "<h1>Welcome, {name}!</h1>\
             <p>You can now join queues instantly, track your position in \
             real time, and get notified when it is your turn.</p>"
        ),
    )
}

pub fn queue_created_sms(queue: &Queue) -> String {
    format!(
        "Queue \"{}\" created. It is live and accepting visitors (id {}).",
        queue.name, queue.id
    )
}

pub fn queue_created_email(queue: &Queue, owner_name: &str) -> (String, String) {
    (
        format!("Queue \"{}\" created", queue.name),
        format!(
            "<h1>Congratulations {owner_name}!</h1>\
             <p>Your queue <strong>{}</strong> is live and accepting \
             visitors.</p><p>Queue ID: {}</p>",
            queue.name, queue.id
        ),
    )
}

pub fn queue_joined_sms(name: &str, queue: &Queue, position: i64, wait_minutes: i64) -> String {
    format!(
        "Hi {name}! You're #{position} in line for \"{}\". Estimated wait: \
         {wait_minutes} min. You'll get updates as the queue moves.",
        queue.name
    )
}

pub fn queue_joined_email(
    name: &str,
    queue: &Queue,
    position: i64,
    wait_minutes: i64,
) -> (String, String) {
    (
        format!("You're in line! Position #{position} - {}", queue.name),
        format!(
            "<h1>Welcome {name}!</h1>\
             <p>You've joined the queue for <strong>{}</strong>.</p>\
             <p>Your position: <strong>#{position}</strong><br>\
             Estimated wait: <strong>{wait_minutes} min</strong><br>\
             Location: {}</p>",
            queue.name,
            location_of(queue)
        ),
    )
}

pub fn your_turn_sms(name: &str, queue: &Queue) -> String {
    format!(
        "IT'S YOUR TURN! Hi {name}, you're now being served at \"{}\" ({}). \
         Please proceed immediately.",
        queue.name,
        location_of(queue)
    )
}

pub fn your_turn_email(name: &str, queue: &Queue) -> (String, String) {
    (
        format!("It's your turn! - {}", queue.name),
        format!(
            "<h1>Hello {name}!</h1>\
             <p>You're now being served at <strong>{}</strong>.</p>\
             <p>Location: {}. Please proceed immediately.</p>",
            queue.name,
            location_of(queue)
        ),
    )
}

pub fn queue_update_sms(name: &str, queue: &Queue, position: i64, wait_minutes: i64) -> String {
    format!(
        "Queue update: Hi {name}, you're now #{position} in line for \"{}\". \
         New wait time: {wait_minutes} min.",
        queue.name
    )
}

pub fn queue_update_email(
    name: &str,
    queue: &Queue,
    position: i64,
    wait_minutes: i64,
) -> (String, String) {
    (
        format!("Queue update - Position #{position} - {}", queue.name),
        format!(
            "<h1>Hi {name}!</h1>\
             <p>Your position in <strong>{}</strong> is now \
             <strong>#{position}</strong> (about {wait_minutes} min).</p>",
            queue.name
        ),
    )
}

pub fn position_alert_sms(name: &str, queue: &Queue, position: i64) -> String {
    let hint = if position == 1 {
        "You're NEXT!"
    } else {
        "Get ready, almost your turn!"
    };
    format!(
        "Alert: Hi {name}, you're now #{position} for \"{}\". {hint}",
        queue.name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_mention_position_and_queue() {
        let mut queue = Queue::new("q-1", 1000, "owner-1", "Front Desk");
        queue.location = Some("2nd floor".to_string());

        let sms = queue_joined_sms("Ada", &queue, 4, 8);
        assert!(sms.contains("#4"));
        assert!(sms.contains("Front Desk"));
        assert!(sms.contains("8 min"));

        let (subject, body) = your_turn_email("Ada", &queue);
        assert!(subject.contains("Front Desk"));
        assert!(body.contains("2nd floor"));
    }

    #[test]
    fn test_position_alert_distinguishes_head() {
        let queue = Queue::new("q-1", 1000, "owner-1", "Front Desk");
        assert!(position_alert_sms("Ada", &queue, 1).contains("NEXT"));
        assert!(position_alert_sms("Ada", &queue, 3).contains("almost your turn"));
    }
}
