//! Simple standalone example of the RGA reducer.
//!
//! Two replicas edit the same document concurrently, exchange the messages
//! their edits produced and end up with the same text.
//!
//! Run with: cargo run --example simple

use rga_reducer::{ChangeEvent, Message, NoopSink, Replica, RgaError};

fn deliver(to: &Replica<char>, messages: &[Message<char>]) -> Result<(), RgaError> {
    for message in messages {
        to.apply(message, &mut NoopSink)?;
    }
    Ok(())
}

fn main() -> Result<(), RgaError> {
    println!("=== Simple RGA Example ===\n");

    // Create two replicas representing two users
    let alice = Replica::new(1);
    let bob = Replica::new(2);

    println!("Alice (replica 1) and Bob (replica 2) start from an empty document\n");

    let mut alice_log = Vec::new();
    for ch in "Hello".chars() {
        alice_log.extend(alice.push(ch).messages);
    }
    println!("Alice types 'Hello':  '{}'", alice.text());

    // Bob catches up first so his edits are anchored in Alice's text
    deliver(&bob, &alice_log)?;
    println!("Bob receives it:      '{}'", bob.text());

    println!("\n--- Concurrent edits ---");
    let mut bob_log = Vec::new();
    for ch in " World".chars() {
        bob_log.extend(bob.push(ch).messages);
    }
    println!("Bob appends ' World': '{}'", bob.text());

    let mut alice_edits = Vec::new();
    if let Some(applied) = alice.insert_at(0, '>') {
        alice_edits.extend(applied.messages);
    }
    alice_edits.extend(alice.set(1, 'J').messages);
    println!("Alice edits the head: '{}'", alice.text());

    println!("\n--- Synchronizing ---");
    deliver(&alice, &bob_log)?;

    // Print what Bob's view would have to do while catching up
    let mut describe = |event: ChangeEvent<char>| match event {
        ChangeEvent::Insert { value, position } => {
            println!("  bob: insert {:?} at {}", value, position)
        }
        ChangeEvent::Remove { position } => println!("  bob: remove at {:?}", position),
    };
    for message in &alice_edits {
        bob.apply(message, &mut describe)?;
    }

    println!("\nAlice sees: '{}'", alice.text());
    println!("Bob sees:   '{}'", bob.text());

    if alice.text() == bob.text() {
        println!("\nReplicas converged");
    } else {
        println!("\nReplicas diverged");
    }
    Ok(())
}
