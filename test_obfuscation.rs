fn main() {
    let config = phish_probe::EngineConfig::default();
    let transforms = phish_probe::DecodingTransforms::new();
    let watchlist = phish_probe::Watchlist::builtin();
    let builder = phish_probe::TreeBuilder::new(&config, &transforms, &watchlist);

    for input in [
        "bG9naW4tcGF5cGFsLXZlcmlmeQ==",
        "next=cGF5cGFsLWFjY291bnQtdXBkYXRl",
        "paypal%2Dlogin%2Dverify",
        "id=550e8400-e29b-41d4-a716-446655440000&token=xK9mQ2vR7pL4wT8nZ3cF",
    ] {
        let root = builder.build(input);
        println!("== {}", input);
        print_node(&root, 0);
    }
}

fn print_node(node: &phish_probe::DecodedNode, indent: usize) {
    println!(
        "{}{} depth={} relevant={} {:?}",
        "  ".repeat(indent),
        node.method.tag(),
        node.depth,
        node.was_relevant,
        node.decoded
    );
    for child in &node.children {
        print_node(child, indent + 1);
    }
}
