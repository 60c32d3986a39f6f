//! End-to-end placement scenarios: offer in, launch descriptor out.

use std::collections::BTreeSet;

use tessera_core::{CPUS, DISK, MEM, Offer, PORTS, PathId, PlacementConfig, Resource, ValueRange};
use tessera_placement::{
    Launch, ResourceMatch, RunningInstance, TaskBuilder, UuidTaskIds, match_resources, place,
};
use tessera_state::{AppDefinition, Container, PortMapping, validate_app};

fn make_offer(resources: Vec<Resource>) -> Offer {
    Offer {
        id: "offer-1".to_string(),
        framework_id: "fw-1".to_string(),
        agent_id: "agent-1".to_string(),
        hostname: "host-1.example.com".to_string(),
        resources,
    }
}

fn standard_offer() -> Offer {
    make_offer(vec![
        Resource::scalar(CPUS, 2.0, "*"),
        Resource::scalar(MEM, 256.0, "*"),
        Resource::ranges(PORTS, vec![ValueRange::new(31000, 32000)], "*"),
    ])
}

fn make_app(cpus: f64, mem: f64, ports: Vec<u32>) -> AppDefinition {
    let mut app = AppDefinition::new(PathId::parse("/prod/web").unwrap());
    app.cmd = Some("python -m http.server $PORT0".to_string());
    app.cpus = cpus;
    app.mem = mem;
    app.ports = ports;
    app
}

fn fixed_id(id: &PathId) -> String {
    format!("{}.fixed", id.safe_path())
}

fn star() -> BTreeSet<String> {
    BTreeSet::from(["*".to_string()])
}

fn assert_match_covers(app: &AppDefinition, matched: &ResourceMatch) {
    let resources = matched.resources(app);
    let total = |name: &str| -> f64 {
        resources
            .iter()
            .filter(|r| r.name == name)
            .filter_map(Resource::scalar_value)
            .sum()
    };
    assert!(total(CPUS) >= app.cpus);
    assert!(total(MEM) >= app.mem);
    if app.disk != 0.0 {
        assert!(total(DISK) >= app.disk);
    }
    assert_eq!(matched.ports.len(), app.required_port_count());
}

#[test]
fn single_dynamic_port_scenario() {
    let app = make_app(1.0, 128.0, vec![0]);
    let offer = standard_offer();

    let matched = match_resources(&offer, &app, &[], &star(), &PlacementConfig::default()).unwrap();
    assert_match_covers(&app, &matched);
    let port = matched.host_ports()[0];
    assert!((31000..=32000).contains(&port));

    let launch = TaskBuilder::new(&app, &PlacementConfig::default(), &fixed_id).build(&offer, &matched);
    let env = &launch.task_info.command.as_ref().unwrap().environment;
    let port = port.to_string();
    assert_eq!(env.get("PORT"), Some(port.as_str()));
    assert_eq!(env.get("PORT0"), Some(port.as_str()));
    assert_eq!(env.get("PORTS"), Some(port.as_str()));
}

#[test]
fn zero_disk_matches_offer_without_disk() {
    let app = make_app(1.0, 128.0, Vec::new());
    let offer = standard_offer();
    assert!(offer.resources.iter().all(|r| r.name != DISK));

    let launch = place(&offer, &app, &[], &PlacementConfig::default(), &fixed_id).unwrap();
    assert!(launch.task_info.resources.iter().all(|r| r.name != DISK));
}

#[test]
fn match_invariants_hold_across_offers() {
    let offers = vec![
        standard_offer(),
        make_offer(vec![
            Resource::scalar(CPUS, 0.5, "*"),
            Resource::scalar(CPUS, 1.0, "*"),
            Resource::scalar(MEM, 512.0, "*"),
            Resource::scalar(DISK, 2048.0, "*"),
            Resource::ranges(PORTS, vec![ValueRange::new(1000, 1001), ValueRange::new(2000, 2010)], "*"),
        ]),
        make_offer(vec![
            Resource::scalar(CPUS, 8.0, "*"),
            Resource::scalar(MEM, 64.0, "*"),
        ]),
    ];
    let mut disk_app = make_app(1.5, 256.0, vec![0, 0, 0]);
    disk_app.disk = 1024.0;
    let apps = vec![
        make_app(1.0, 128.0, vec![0]),
        make_app(0.25, 32.0, Vec::new()),
        disk_app,
        make_app(1.0, 128.0, vec![0, 0, 0, 0]),
    ];

    let config = PlacementConfig::default();
    let mut matches = 0;
    for offer in &offers {
        for app in &apps {
            if let Some(matched) = match_resources(offer, app, &[], &star(), &config) {
                matches += 1;
                assert_match_covers(app, &matched);

                let launch = TaskBuilder::new(app, &config, &fixed_id).build(offer, &matched);
                assert_eq!(launch.host_ports.len(), matched.ports.len());
                assert_eq!(launch.task_info.resources, matched.resources(app));
            }
        }
    }
    assert!(matches >= 4, "expected several matches, got {matches}");
}

#[test]
fn bridge_mapping_receives_assigned_ports() {
    let mut app = make_app(1.0, 128.0, Vec::new());
    let mut container = Container::docker("nginx:1.25");
    container.docker.as_mut().unwrap().port_mappings =
        Some(vec![PortMapping::new(0, 0), PortMapping::new(80, 0)]);
    app.container = Some(container);
    assert!(validate_app(&app).is_ok());

    let launch = place(&standard_offer(), &app, &[], &PlacementConfig::default(), &fixed_id).unwrap();
    assert_eq!(launch.host_ports, vec![31000, 31001]);

    let docker = launch.task_info.container.as_ref().unwrap().docker.as_ref().unwrap();
    assert_eq!(docker.port_mappings[0].container_port, 31000);
    assert_eq!(docker.port_mappings[0].host_port, 31000);
    assert_eq!(docker.port_mappings[1].container_port, 80);
    assert_eq!(docker.port_mappings[1].host_port, 31001);

    let env = &launch.task_info.command.as_ref().unwrap().environment;
    assert_eq!(env.get("PORT_80"), Some("31001"));
    assert_eq!(env.get("MARATHON_APP_DOCKER_IMAGE"), Some("nginx:1.25"));
}

#[test]
fn incremental_packing_uses_ledger() {
    let offer = make_offer(vec![
        Resource::scalar(CPUS, 4.0, "*"),
        Resource::scalar(MEM, 1024.0, "*"),
        Resource::ranges(PORTS, vec![ValueRange::new(31000, 31001)], "*"),
    ]);
    let app = make_app(1.0, 128.0, vec![0]);
    let config = PlacementConfig::default();

    let mut ledger: Vec<RunningInstance> = Vec::new();
    let mut launches: Vec<Launch> = Vec::new();
    while let Some(launch) = place(&offer, &app, &ledger, &config, &UuidTaskIds) {
        ledger.push(RunningInstance {
            task_id: launch.task_info.task_id.clone(),
            host: offer.hostname.clone(),
            ports: launch.host_ports.clone(),
        });
        launches.push(launch);
    }

    assert_eq!(launches.len(), 2);
    assert_eq!(launches[0].host_ports, vec![31000]);
    assert_eq!(launches[1].host_ports, vec![31001]);
    assert_ne!(launches[0].task_info.task_id, launches[1].task_info.task_id);
}

#[test]
fn required_ports_must_be_offered() {
    let mut app = make_app(1.0, 128.0, vec![8080]);
    app.require_ports = true;
    assert!(place(&standard_offer(), &app, &[], &PlacementConfig::default(), &fixed_id).is_none());

    app.ports = vec![31500];
    let launch = place(&standard_offer(), &app, &[], &PlacementConfig::default(), &fixed_id).unwrap();
    assert_eq!(launch.host_ports, vec![31500]);
    let env = &launch.task_info.command.as_ref().unwrap().environment;
    assert_eq!(env.get("PORT_31500"), Some("31500"));
}

#[test]
fn descriptor_serializes_for_transport() {
    let app = make_app(1.0, 128.0, vec![0]);
    let launch = place(&standard_offer(), &app, &[], &PlacementConfig::default(), &fixed_id).unwrap();
    let json = serde_json::to_value(&launch.task_info).unwrap();
    assert_eq!(json["task_id"], "prod_web.fixed");
    assert_eq!(json["resources"][0]["name"], "cpus");
    assert_eq!(json["resources"][2]["type"], "ranges");
}
